//! Features layer - the upload providers exposed to the admin panel

pub mod upload_file;
