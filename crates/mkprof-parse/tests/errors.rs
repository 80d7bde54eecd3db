use mkprof_parse::{parse_str, ParseError};

const TAIL: &str = "FC = f\nLD = f\nCC = c\n";

#[test]
fn missing_compiler_is_error() {
    let err = parse_str("t", "LD = f\nCC = c\n").unwrap_err();
    assert!(matches!(err, ParseError::MissingKey { key: "FC" }));
    assert_eq!(err.to_string(), "missing required key 'FC'");
}

#[test]
fn empty_linker_is_error() {
    let err = parse_str("t", "FC = f\nLD =\nCC = c\n").unwrap_err();
    assert!(matches!(err, ParseError::EmptyValue { key: "LD", line: 2 }));
}

#[test]
fn duplicate_key_reports_both_lines() {
    let src = format!("FFLAGS = -O2\nFFLAGS = -O0\n{}", TAIL);
    let err = parse_str("t", &src).unwrap_err();
    assert!(matches!(
        err,
        ParseError::DuplicateKey { ref key, line: 2, first: 1 } if key == "FFLAGS"
    ));
    assert!(err.to_string().contains("use '+=' to extend it"));
}

#[test]
fn append_to_undefined_is_error() {
    let src = format!("FFLAGS += -O2\n{}", TAIL);
    let err = parse_str("t", &src).unwrap_err();
    assert!(matches!(err, ParseError::AppendToUndefined { line: 1, .. }));
}

#[test]
fn missing_equals_is_error() {
    let err = parse_str("t", "FC mpif90\n").unwrap_err().to_string();
    assert!(err.contains("line 1: expected '=' after 'FC'"), "{}", err);
}

#[test]
fn unsupported_operator_is_error() {
    let err = parse_str("t", "FC := mpif90\n").unwrap_err().to_string();
    assert!(err.contains("unsupported assignment operator ':='"), "{}", err);
}

#[test]
fn invalid_key_is_error() {
    let err = parse_str("t", "2FC = mpif90\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidKey { ref key, line: 1 } if key == "2FC"));
}

#[test]
fn line_without_name_is_error() {
    let err = parse_str("t", "FC = f\n= oops\n").unwrap_err().to_string();
    assert!(err.contains("line 2: expected variable name"), "{}", err);
}

#[test]
fn unterminated_reference_is_error() {
    let src = format!("FFLAGS = $(CPPFLAGS -O2\n{}", TAIL);
    let err = parse_str("t", &src).unwrap_err().to_string();
    assert!(err.contains("unterminated `$(` reference"), "{}", err);
}

#[test]
fn recursive_variable_is_error() {
    let src = format!("A = $(B)\nB = $(A)\nFFLAGS = $(A)\n{}", TAIL);
    let err = parse_str("t", &src).unwrap_err();
    assert!(matches!(err, ParseError::RecursiveVariable { .. }));
}

#[test]
fn unused_recursive_variable_is_not_expanded() {
    let src = format!("A = $(A)\n{}", TAIL);
    assert!(parse_str("t", &src).is_ok());
}

#[test]
fn read_error_names_the_file() {
    let err = mkprof_parse::parse_file("/nonexistent/mkmf.template.x").unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/mkmf.template.x"));
}

#[test]
fn oversized_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mkmf.template.big");
    std::fs::write(&path, "#".repeat(mkprof_parse::MAX_TEMPLATE_SIZE + 1)).unwrap();
    let err = mkprof_parse::parse_file(&path).unwrap_err();
    assert!(matches!(err, ParseError::TooLarge { size, .. } if size == mkprof_parse::MAX_TEMPLATE_SIZE + 1));
}

#[test]
fn runaway_expansion_is_bounded() {
    let mut src = String::from("V0 = x\n");
    for i in 1..24 {
        src.push_str(&format!("V{} = $(V{}) $(V{})\n", i, i - 1, i - 1));
    }
    src.push_str("CFLAGS = $(V23)\n");
    src.push_str(TAIL);
    assert!(src.len() < 1_000);

    let err = parse_str("t", &src).unwrap_err();
    assert!(matches!(err, ParseError::ExpansionTooLarge { .. }), "{}", err);
    assert!(err.to_string().contains("more than 4000000 bytes"), "{}", err);
}
