pub mod announcement;
pub mod attendance;
pub mod department;
pub mod designation;
pub mod holiday;
pub mod leave;
pub mod payroll;
pub mod role;
pub mod user;
