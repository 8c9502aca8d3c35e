pub mod scope;
pub mod size;
pub mod url_ext;
