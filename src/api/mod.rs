pub mod company;
pub mod employee;
pub mod import;
pub mod leave_request;
