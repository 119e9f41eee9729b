pub(crate) mod navbar;
pub(crate) mod toaster;
pub mod ui;

pub(crate) use navbar::Navbar;
pub(crate) use toaster::Toaster;
