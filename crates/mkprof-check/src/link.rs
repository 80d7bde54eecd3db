//! Library order on the link line.

use mkprof_profile::flags::FlagGroup;

pub const NETCDF_FORTRAN: &str = "-lnetcdff";
pub const NETCDF_C: &str = "-lnetcdf";
/// Accepted spellings of the MPI library, the first one is canonical.
pub const MPI_LIBS: &[&str] = &["-lmpi", "-lmpifort", "-lmpi_mpifh", "-lmpich", "-lmpichf90"];

/// Where the three libraries sit on a link line. NetCDF-Fortran uses its
/// first occurrence, the libraries it depends on their last, so a
/// repeated library still satisfies the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOrder {
    pub netcdf_fortran: Option<usize>,
    pub netcdf_c: Option<usize>,
    pub mpi: Option<usize>,
}

impl LinkOrder {
    pub fn scan(line: &FlagGroup) -> Self {
        Self {
            netcdf_fortran: line.position(NETCDF_FORTRAN),
            netcdf_c: line.last_position(NETCDF_C),
            mpi: MPI_LIBS.iter().filter_map(|l| line.last_position(l)).max(),
        }
    }

    /// Pairs `(earlier, later)` that appear in the wrong order.
    pub fn violations(&self) -> Vec<(&'static str, &'static str)> {
        let mut out = Vec::new();
        let before = |a: Option<usize>, b: Option<usize>| matches!((a, b), (Some(a), Some(b)) if a > b);
        if before(self.netcdf_fortran, self.netcdf_c) {
            out.push((NETCDF_FORTRAN, NETCDF_C));
        }
        if before(self.netcdf_c, self.mpi) {
            out.push((NETCDF_C, MPI_LIBS[0]));
        }
        if self.netcdf_c.is_none() && before(self.netcdf_fortran, self.mpi) {
            out.push((NETCDF_FORTRAN, MPI_LIBS[0]));
        }
        out
    }
}
