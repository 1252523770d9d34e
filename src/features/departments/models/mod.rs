mod department;

pub use department::{Department, DepartmentWithCounts};
