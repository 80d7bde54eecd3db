//! Integration tests for profile consistency checks

use mkprof_check::{CheckError, KindConvention, ProfileChecker, WrapperFamily};
use mkprof_parse::parse_str;

const IA64: &str = r#"
CPPFLAGS = -I/usr/local/include -I/usr/local/netcdf-4.3.3.1/include
FFLAGS = $(CPPFLAGS) -fpp -stack_temps -ftz -assume byterecl -shared-intel -i4 -r8 -g -O2
FC = mpif90
LD = mpif90 -L/usr/local/netcdf-4.3.3.1/lib/
CC = mpicc
LDFLAGS = -L$(LD_LIBRARY_PATH) -lnetcdff -lnetcdf -lmpi -shared-intel
CFLAGS = -D__IFC
"#;

fn check(src: &str) -> Result<mkprof_check::CheckReport, Vec<CheckError>> {
    let profile = parse_str("<test>", src).expect("parse failed");
    ProfileChecker::new().check(&profile)
}

fn check_err(src: &str) -> Vec<CheckError> {
    check(src).expect_err("profile should be inconsistent")
}

#[test]
fn ia64_is_consistent() {
    let report = check(IA64).expect("ia64 should pass");
    assert_eq!(report.kinds, KindConvention::I4_R8);
    assert_eq!(report.family, WrapperFamily::Mpi);
    assert_eq!(report.open_variables, ["-L$(LD_LIBRARY_PATH)"]);
}

#[test]
fn missing_kind_flags_are_reported() {
    let errs = check_err(&IA64.replace(" -i4 -r8", ""));
    assert_eq!(
        errs,
        [CheckError::KindConvention {
            found: KindConvention::default(),
            expected: KindConvention::I4_R8,
        }]
    );
}

#[test]
fn mixed_kind_flags_in_fflags() {
    let errs = check_err(&IA64.replace("-i4 -r8", "-i4 -r8 -r4"));
    assert!(matches!(
        &errs[0],
        CheckError::KindConflict { group: "FFLAGS", first, second, .. } if first == "-r8" && second == "-r4"
    ));
}

#[test]
fn linker_kind_override_is_reported() {
    let errs = check_err(&IA64.replace(
        "LD = mpif90 -L/usr/local/netcdf-4.3.3.1/lib/",
        "LD = mpif90 -r4 -L/usr/local/netcdf-4.3.3.1/lib/",
    ));
    assert!(matches!(errs[0], CheckError::KindMismatch { group: "LD", .. }));
    assert!(errs[0].to_string().contains("disagrees with FFLAGS (-i4 -r8)"));
}

#[test]
fn agreeing_linker_kinds_are_fine() {
    let src = IA64.replace("LD = mpif90 ", "LD = mpif90 -r8 ");
    assert!(check(&src).is_ok());
}

#[test]
fn mixed_wrapper_families() {
    let errs = check_err(&IA64.replace("CC = mpicc", "CC = mpiicc"));
    assert_eq!(
        errs,
        [CheckError::MixedWrappers {
            fc: WrapperFamily::Mpi,
            cc: WrapperFamily::IntelMpi,
            ld: WrapperFamily::Mpi,
        }]
    );
}

#[test]
fn bare_compiler_is_rejected() {
    let errs = check_err(&IA64.replace("CC = mpicc", "CC = gcc"));
    assert!(errs.iter().any(|e| matches!(
        e,
        CheckError::NotMpiWrapper { key: "CC", program, .. } if program == "gcc"
    )));
    assert!(errs
        .iter()
        .any(|e| matches!(e, CheckError::MixedWrappers { .. })));
}

#[test]
fn link_order_violation() {
    let errs = check_err(&IA64.replace("-lnetcdff -lnetcdf -lmpi", "-lnetcdf -lnetcdff -lmpi"));
    assert_eq!(
        errs,
        [CheckError::LinkOrder {
            before: "-lnetcdff",
            after: "-lnetcdf",
        }]
    );
}

#[test]
fn mpi_before_netcdf_violation() {
    let errs = check_err(&IA64.replace("-lnetcdff -lnetcdf -lmpi", "-lmpi -lnetcdff -lnetcdf"));
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].to_string(), "link order: -lnetcdf must come before -lmpi");
}

#[test]
fn missing_library_mentions_open_references() {
    let errs = check_err(&IA64.replace("-lnetcdff -lnetcdf", "`nf-config --flibs`"));
    assert_eq!(errs.len(), 2);
    let msg = errs[0].to_string();
    assert!(msg.starts_with("link line is missing -lnetcdff"), "{}", msg);
    assert!(msg.contains("`nf-config --flibs`"), "{}", msg);
}

#[test]
fn cray_drivers_may_omit_mpi_library() {
    let src = r#"
FFLAGS = -i4 -r8
FC = ftn
LD = ftn
CC = cc
LDFLAGS = -lnetcdff -lnetcdf
"#;
    let report = check(src).expect("cray profile should pass");
    assert_eq!(report.family, WrapperFamily::Cray);
}

#[test]
fn all_findings_are_collected() {
    let src = r#"
FFLAGS = -O2
FC = gfortran
LD = gfortran
CC = gcc
LDFLAGS = -lnetcdf -lnetcdff
"#;
    let errs = check_err(src);
    // kinds, three bare programs, missing MPI library, link order
    assert_eq!(errs.len(), 6, "{:?}", errs);
}

#[test]
fn custom_kind_convention() {
    let src = IA64.replace("-i4 -r8", "-i8 -r8");
    let profile = parse_str("i8", &src).unwrap();
    let checker = ProfileChecker::new().with_expected_kinds(KindConvention {
        integer: Some(8),
        real: Some(8),
    });
    assert!(checker.check(&profile).is_ok());
    assert!(ProfileChecker::new().check(&profile).is_err());
}

#[cfg(feature = "serde")]
#[test]
fn report_serializes() {
    let profile = parse_str("ia64", IA64).unwrap();
    let report = ProfileChecker::new().check(&profile).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["profile"], "ia64");
    assert_eq!(json["family"], "Mpi");
    assert_eq!(json["kinds"]["integer"], 4);
}
