pub mod descriptor;
pub mod registry;
