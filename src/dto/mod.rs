pub mod evaluation_dto;
pub mod recommendation_dto;
