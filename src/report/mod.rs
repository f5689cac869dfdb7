//! 报告生成
//!
//! `layout` 负责分页和定位，`pdf_writer` 负责序列化，两者都是确定性的

pub mod layout;
pub mod pdf_writer;
pub mod winansi;

pub use layout::{layout, Layout};
pub use pdf_writer::write_pdf;
