pub mod blob;
pub mod mimetype;
pub mod qr;
