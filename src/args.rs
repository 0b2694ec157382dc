use serde_json::Value;

/// Turn one free-text argument line into an ordered list of typed values.
///
/// A line starting with `[` is first tried as a JSON array, whose elements
/// are returned as decoded. Anything else (including JSON that fails to
/// decode) is split on commas and each token classified on its own. This
/// never fails: unrecognized tokens come back as plain strings.
pub fn parse(input: &str) -> Vec<Value> {
	let trimmed = input.trim();
	if trimmed.is_empty() {
		return Vec::new();
	}

	if trimmed.starts_with('[') {
		if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
			return items;
		}
	}

	trimmed
		.split(',')
		.map(str::trim)
		.filter(|t| !t.is_empty())
		.map(classify)
		.collect()
}

/// Classify one comma-separated token. Order matters: quoted strings win
/// over everything, and hex literals are never coerced to numbers.
fn classify(token: &str) -> Value {
	if let Some(inner) = strip_quotes(token) {
		return Value::String(inner.to_owned());
	}
	if token.eq_ignore_ascii_case("true") {
		return Value::Bool(true);
	}
	if token.eq_ignore_ascii_case("false") {
		return Value::Bool(false);
	}
	if is_hex_literal(token) {
		return Value::String(token.to_owned());
	}
	if let Some(number) = numeric(token) {
		return number;
	}
	Value::String(token.to_owned())
}

fn strip_quotes(token: &str) -> Option<&str> {
	if token.len() < 2 {
		return None;
	}
	for quote in ['"', '\''] {
		if token.starts_with(quote) && token.ends_with(quote) {
			return Some(&token[1..token.len() - 1]);
		}
	}
	None
}

fn is_hex_literal(token: &str) -> bool {
	token
		.strip_prefix("0x")
		.is_some_and(|tail| !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn numeric(token: &str) -> Option<Value> {
	let float: f64 = token.parse().ok()?;
	if !float.is_finite() {
		return None;
	}

	if token.contains('.') {
		return serde_json::Number::from_f64(float).map(Value::Number);
	}

	if let Ok(i) = token.parse::<i64>() {
		return Some(Value::from(i));
	}
	if let Ok(u) = token.parse::<u64>() {
		return Some(Value::from(u));
	}

	// Wider than 64 bits: keep plain digit strings verbatim so uint256
	// arguments survive without rounding.
	let digits = token.strip_prefix('-').unwrap_or(token);
	if digits.bytes().all(|b| b.is_ascii_digit()) {
		return Some(Value::String(token.to_owned()));
	}

	// Exponent forms like `1e5`.
	if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
		return Some(Value::from(float as i64));
	}
	serde_json::Number::from_f64(float).map(Value::Number)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn empty_input_yields_nothing() {
		assert!(parse("").is_empty());
		assert!(parse("  ").is_empty());
		assert!(parse(" , ,").is_empty());
	}

	#[test]
	fn mixed_tokens() {
		assert_eq!(
			parse(r#""alice", 42, true, 0xAB12"#),
			vec![json!("alice"), json!(42), json!(true), json!("0xAB12")]
		);
	}

	#[test]
	fn decimal_point_forces_float() {
		let parsed = parse("1.5, 2");
		assert_eq!(parsed, vec![json!(1.5), json!(2)]);
		assert!(parsed[0].is_f64());
		assert!(parsed[1].is_i64());
	}

	#[test]
	fn json_array_preserves_types() {
		assert_eq!(parse(r#"[1,"x",false]"#), vec![json!(1), json!("x"), json!(false)]);
		assert_eq!(
			parse(r#"  [[1, 2], {"a": null}]"#),
			vec![json!([1, 2]), json!({"a": null})]
		);
	}

	#[test]
	fn malformed_json_falls_back_to_tokens() {
		assert_eq!(parse("[1, 2"), vec![json!("[1"), json!(2)]);
	}

	#[test]
	fn quotes_beat_other_rules() {
		assert_eq!(
			parse(r#"'true', "42", '0xff'"#),
			vec![json!("true"), json!("42"), json!("0xff")]
		);
		// A lone quote character is not a quoted string.
		assert_eq!(parse(r#"""#), vec![json!("\"")]);
	}

	#[test]
	fn booleans_are_case_insensitive() {
		assert_eq!(parse("TRUE, False"), vec![json!(true), json!(false)]);
	}

	#[test]
	fn hex_is_never_numeric() {
		assert_eq!(parse("0x10"), vec![json!("0x10")]);
		assert_eq!(parse("0x"), vec![json!("0x")]);
		assert_eq!(parse("0xzz"), vec![json!("0xzz")]);
	}

	#[test]
	fn wide_integers_keep_their_digits() {
		let big = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
		assert_eq!(parse(big), vec![json!(big)]);
		assert_eq!(parse("18446744073709551615"), vec![json!(18446744073709551615u64)]);
		assert_eq!(parse("-7"), vec![json!(-7)]);
	}

	#[test]
	fn plain_words_stay_strings() {
		assert_eq!(parse("alice, bob smith"), vec![json!("alice"), json!("bob smith")]);
		assert_eq!(parse("NaN, inf"), vec![json!("NaN"), json!("inf")]);
	}
}
