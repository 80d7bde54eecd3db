//! MPI compiler-wrapper families.

use std::fmt;

use mkprof_profile::flags::Invocation;

/// Which compiler-wrapper suite a program belongs to. Mixing suites across
/// `FC`, `CC` and `LD` links against two different MPI builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WrapperFamily {
    /// MPICH / Open MPI style wrappers (`mpif90`, `mpicc`, ...)
    Mpi,
    /// Intel MPI wrappers around the Intel compilers (`mpiifort`, `mpiicc`, ...)
    IntelMpi,
    /// Cray programming environment drivers (`ftn`, `cc`, `CC`)
    Cray,
    /// A compiler with no MPI wrapper (`gfortran`, `ifort`, ...)
    Bare,
    /// Not recognised, including programs left as open references
    Unknown,
}

const MPI: &[&str] = &["mpif90", "mpif77", "mpifort", "mpicc", "mpicxx", "mpiCC", "mpic++"];
const INTEL_MPI: &[&str] = &["mpiifort", "mpiifx", "mpiicc", "mpiicx", "mpiicpc", "mpiicpx"];
const CRAY: &[&str] = &["ftn", "cc", "CC"];
const BARE: &[&str] = &[
    "gfortran", "gcc", "g++", "ifort", "ifx", "icc", "icx", "icpc", "icpx", "clang", "flang",
    "nvfortran", "nvc", "pgf90", "pgcc", "f90", "f95",
];

impl WrapperFamily {
    pub fn classify(inv: &Invocation) -> Self {
        let name = normalize(inv.basename());
        if MPI.contains(&name) {
            WrapperFamily::Mpi
        } else if INTEL_MPI.contains(&name) {
            WrapperFamily::IntelMpi
        } else if CRAY.contains(&name) {
            WrapperFamily::Cray
        } else if BARE.contains(&name) {
            WrapperFamily::Bare
        } else {
            WrapperFamily::Unknown
        }
    }

    /// True for families that wrap an MPI installation.
    pub fn is_mpi(&self) -> bool {
        matches!(
            self,
            WrapperFamily::Mpi | WrapperFamily::IntelMpi | WrapperFamily::Cray
        )
    }

    /// Families whose drivers add the MPI libraries on their own, so an
    /// explicit MPI library on the link line is optional.
    pub fn links_mpi_implicitly(&self) -> bool {
        matches!(self, WrapperFamily::IntelMpi | WrapperFamily::Cray)
    }

    pub fn name(&self) -> &'static str {
        match self {
            WrapperFamily::Mpi => "MPI",
            WrapperFamily::IntelMpi => "Intel MPI",
            WrapperFamily::Cray => "Cray PE",
            WrapperFamily::Bare => "bare compiler",
            WrapperFamily::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WrapperFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drop distro suffixes: `mpif90.openmpi` -> `mpif90`, `gfortran-12` -> `gfortran`.
fn normalize(name: &str) -> &str {
    let name = name.split('.').next().unwrap_or(name);
    match name.rsplit_once('-') {
        Some((base, ver)) if !ver.is_empty() && ver.chars().all(|c| c.is_ascii_digit()) => base,
        _ => name,
    }
}
