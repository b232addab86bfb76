pub mod shipment;
pub mod timestamp;
pub mod view;
pub mod bucket;

pub use shipment::*;
pub use view::*;
pub use bucket::*;

use chrono::{Local, NaiveDateTime};

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
