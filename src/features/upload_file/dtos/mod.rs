mod uploaded_file_dto;

pub use uploaded_file_dto::UploadedFile;
