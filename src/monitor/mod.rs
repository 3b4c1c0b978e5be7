pub mod alert;
pub mod constants;
pub mod emergency;
pub mod health;
pub mod memory;
pub mod optimize;
pub mod overload;
pub mod tps;
pub mod view_distance;
pub mod viewers;
pub mod window;
