//! 시세 및 뉴스 도메인 모델.

mod news;
mod stock;

pub use news::*;
pub use stock::*;
