mod module_name;
mod stdlib;
mod utils;

pub use module_name::ModuleName;
pub use stdlib::is_stdlib_module;
pub use utils::format_symbol_list;
