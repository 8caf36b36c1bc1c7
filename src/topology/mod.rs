//! Reference element shapes.

pub mod cell_type;

pub use cell_type::CellType;
