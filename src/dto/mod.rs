pub mod job_dto;
pub mod news_dto;
pub mod preference_dto;
