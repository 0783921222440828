pub mod calendar;
pub mod policy;
pub mod service;

pub use calendar::business_days;
pub use policy::{AutoApprovePolicy, Decision};
pub use service::{LeaveService, SubmitLeave};
