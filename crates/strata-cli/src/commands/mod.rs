pub mod check;
pub mod generate;
pub mod render;
pub mod template_list;
