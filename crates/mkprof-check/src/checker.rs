// crates/mkprof-check/src/checker.rs
// Consistency checker for toolchain profiles

use mkprof_profile::flags::FlagGroup;
use mkprof_profile::profile::ToolchainProfile;
use thiserror::Error;

use crate::kind::{KindConflict, KindConvention, KindDimension};
use crate::link::{LinkOrder, MPI_LIBS, NETCDF_C, NETCDF_FORTRAN};
use crate::wrapper::WrapperFamily;

/// Inconsistencies found in a profile
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// One flag group sets two different widths for the same kind
    #[error("{group}: conflicting {dimension} kind flags '{first}' and '{second}'")]
    KindConflict {
        group: &'static str,
        dimension: KindDimension,
        first: String,
        second: String,
    },
    /// FFLAGS does not select the required convention
    #[error("FFLAGS selects {found}, expected {expected}")]
    KindConvention {
        found: KindConvention,
        expected: KindConvention,
    },
    /// A Fortran invocation overrides the FFLAGS convention
    #[error("{group} passes {found}, which disagrees with FFLAGS ({expected})")]
    KindMismatch {
        group: &'static str,
        found: KindConvention,
        expected: KindConvention,
    },
    /// FC, CC or LD is not an MPI compiler wrapper
    #[error("{key} = {program} is not an MPI compiler wrapper ({family})")]
    NotMpiWrapper {
        key: &'static str,
        program: String,
        family: WrapperFamily,
    },
    /// FC, CC and LD come from different wrapper suites
    #[error("mixed compiler wrappers: FC is {fc}, CC is {cc}, LD is {ld}")]
    MixedWrappers {
        fc: WrapperFamily,
        cc: WrapperFamily,
        ld: WrapperFamily,
    },
    /// A required library is absent from LD + LDFLAGS
    #[error("link line is missing {library}{}", open_hint(.open))]
    MissingLibrary {
        library: &'static str,
        /// open references that may supply it at build time
        open: Vec<String>,
    },
    /// Two libraries are on the link line in the wrong order
    #[error("link order: {before} must come before {after}")]
    LinkOrder {
        before: &'static str,
        after: &'static str,
    },
}

fn open_hint(open: &[String]) -> String {
    if open.is_empty() {
        String::new()
    } else {
        format!(" (unless provided by {})", open.join(", "))
    }
}

/// What a consistent profile resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckReport {
    pub profile: String,
    pub kinds: KindConvention,
    pub family: WrapperFamily,
    /// References the invoking environment must provide
    pub open_variables: Vec<String>,
}

/// Checks kind convention, wrapper family and link order, collecting every
/// finding rather than stopping at the first.
#[derive(Debug, Clone)]
pub struct ProfileChecker {
    expected_kinds: KindConvention,
}

impl Default for ProfileChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileChecker {
    pub fn new() -> Self {
        Self {
            expected_kinds: KindConvention::I4_R8,
        }
    }

    /// Require a different kind convention than `-i4 -r8`.
    pub fn with_expected_kinds(mut self, kinds: KindConvention) -> Self {
        self.expected_kinds = kinds;
        self
    }

    pub fn check(&self, profile: &ToolchainProfile) -> Result<CheckReport, Vec<CheckError>> {
        let mut errors = Vec::new();

        let kinds = self.check_kinds(profile, &mut errors);
        let family = check_wrappers(profile, &mut errors);
        check_link_order(profile, family, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CheckReport {
            profile: profile.name.clone(),
            kinds,
            family,
            open_variables: profile.open_variables(),
        })
    }

    fn check_kinds(
        &self,
        profile: &ToolchainProfile,
        errors: &mut Vec<CheckError>,
    ) -> KindConvention {
        let fflags = match scan_group("FFLAGS", &profile.fflags) {
            Ok(k) => k,
            Err(e) => {
                errors.push(e);
                return KindConvention::default();
            }
        };
        if fflags != self.expected_kinds {
            errors.push(CheckError::KindConvention {
                found: fflags,
                expected: self.expected_kinds,
            });
        }

        // every Fortran translation unit passes through FC, and LD drives
        // the same compiler for the link step
        for (group, args) in [("FC", &profile.fc.args), ("LD", &profile.ld.args)] {
            match scan_group(group, args) {
                Ok(k) if !k.agrees_with(&fflags) => errors.push(CheckError::KindMismatch {
                    group,
                    found: k,
                    expected: fflags,
                }),
                Ok(_) => {}
                Err(e) => errors.push(e),
            }
        }
        fflags
    }
}

fn scan_group(group: &'static str, flags: &FlagGroup) -> Result<KindConvention, CheckError> {
    KindConvention::scan(flags).map_err(
        |KindConflict {
             dimension,
             first,
             second,
         }| CheckError::KindConflict {
            group,
            dimension,
            first,
            second,
        },
    )
}

fn check_wrappers(profile: &ToolchainProfile, errors: &mut Vec<CheckError>) -> WrapperFamily {
    let fc = WrapperFamily::classify(&profile.fc);
    let cc = WrapperFamily::classify(&profile.cc);
    let ld = WrapperFamily::classify(&profile.ld);

    for (key, inv, family) in [
        ("FC", &profile.fc, fc),
        ("CC", &profile.cc, cc),
        ("LD", &profile.ld, ld),
    ] {
        if !family.is_mpi() {
            errors.push(CheckError::NotMpiWrapper {
                key,
                program: inv.program.clone(),
                family,
            });
        }
    }
    if fc != cc || fc != ld {
        errors.push(CheckError::MixedWrappers { fc, cc, ld });
    }
    fc
}

fn check_link_order(
    profile: &ToolchainProfile,
    family: WrapperFamily,
    errors: &mut Vec<CheckError>,
) {
    let line = profile.link_line();
    let order = LinkOrder::scan(&line);
    let open: Vec<String> = line
        .iter()
        .filter(|w| mkprof_profile::profile::is_open_reference(w))
        .map(String::from)
        .collect();

    let mut missing = |library| {
        errors.push(CheckError::MissingLibrary {
            library,
            open: open.clone(),
        })
    };
    if order.netcdf_fortran.is_none() {
        missing(NETCDF_FORTRAN);
    }
    if order.netcdf_c.is_none() {
        missing(NETCDF_C);
    }
    if order.mpi.is_none() && !family.links_mpi_implicitly() {
        missing(MPI_LIBS[0]);
    }

    for (before, after) in order.violations() {
        errors.push(CheckError::LinkOrder { before, after });
    }
}
