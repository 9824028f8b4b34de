use bozor_api::csv::push_row;
use bozor_api::notify::format_sum;

#[test]
fn plain_fields_are_joined_with_commas() {
    let mut out = String::new();
    push_row(&mut out, ["id", "status", "total"]);
    assert_eq!(out, "id,status,total\n");
}

#[test]
fn fields_with_separators_are_quoted() {
    let mut out = String::new();
    push_row(&mut out, ["Toshkent, Chilonzor", "plain"]);
    assert_eq!(out, "\"Toshkent, Chilonzor\",plain\n");
}

#[test]
fn embedded_quotes_are_doubled() {
    let mut out = String::new();
    push_row(&mut out, [r#"Aziz "Usta" Karimov"#]);
    assert_eq!(out, "\"Aziz \"\"Usta\"\" Karimov\"\n");
}

#[test]
fn newlines_force_quoting() {
    let mut out = String::new();
    push_row(&mut out, ["line1\nline2", "a\rb"]);
    assert_eq!(out, "\"line1\nline2\",\"a\rb\"\n");
}

#[test]
fn rows_accumulate_into_one_document() {
    let mut out = String::new();
    push_row(&mut out, ["h1", "h2"]);
    push_row(&mut out, ["v1", "v2"]);
    assert_eq!(out, "h1,h2\nv1,v2\n");
}

#[test]
fn sums_get_thousands_separators() {
    assert_eq!(format_sum(0), "0");
    assert_eq!(format_sum(999), "999");
    assert_eq!(format_sum(1_000), "1 000");
    assert_eq!(format_sum(85_000), "85 000");
    assert_eq!(format_sum(1_250_000), "1 250 000");
}
