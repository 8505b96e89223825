use crate::models::{
    AuthResponse, ComplaintItem, LoginRequest, LostFoundItem, MenuItem, MenuTextRequest, MessageResponse,
    PublicUser, RegisterRequest,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::register,
        crate::routes::login,
        crate::routes::create_lost_found,
        crate::routes::list_lost_found,
        crate::routes::create_complaint,
        crate::routes::list_complaints,
        crate::routes::update_menu,
        crate::routes::get_menu,
        crate::routes::update_menu_text,
    ),
    components(schemas(
        RegisterRequest, LoginRequest, AuthResponse, PublicUser, MessageResponse,
        LostFoundItem, ComplaintItem, MenuItem, MenuTextRequest
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "lost-found", description = "Lost and found board"),
        (name = "complaints", description = "Complaint submissions"),
        (name = "menu", description = "Daily menu board"),
    )
)]
pub struct ApiDoc;
