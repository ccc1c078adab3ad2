pub mod logging;
pub mod timing;
