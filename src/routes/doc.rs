use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        chat::{ChatReply, ChatRequest, ChatTurn},
        me::{UpdateMeRequest, UpdateProfileRequest},
        mechanics::MechanicList,
        reviews::{CreateReviewRequest, ReviewList, ReviewWithWorkshop, UpdateReviewRequest},
        service_requests::{CreateServiceRequestRequest, ServiceRequestList},
        workshops::{CreateWorkshopRequest, UpdateWorkshopRequest, WorkshopList},
    },
    models::{
        Availability, MechanicProfile, Profile, RequestStatus, Review, ServiceRequest, ServiceType,
        Urgency, User, Workshop,
    },
    response::{ApiResponse, Meta},
    routes::{chatbot, health, me, mechanics, params, reviews, service_requests, workshops},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        me::get_me,
        me::update_me,
        me::get_profile,
        me::update_profile,
        workshops::list_workshops,
        workshops::nearby_workshops,
        workshops::my_workshop,
        workshops::get_workshop,
        workshops::create_workshop,
        workshops::update_workshop,
        workshops::delete_workshop,
        service_requests::create_request,
        service_requests::list_requests,
        service_requests::get_request,
        service_requests::accept_request,
        service_requests::start_request,
        service_requests::complete_request,
        service_requests::cancel_request,
        reviews::create_review,
        reviews::list_reviews,
        reviews::update_review,
        reviews::delete_review,
        mechanics::list_mechanics,
        chatbot::chatbot
    ),
    components(
        schemas(
            User,
            Profile,
            Workshop,
            ServiceRequest,
            Review,
            MechanicProfile,
            ServiceType,
            Urgency,
            Availability,
            RequestStatus,
            UpdateMeRequest,
            UpdateProfileRequest,
            CreateWorkshopRequest,
            UpdateWorkshopRequest,
            WorkshopList,
            CreateServiceRequestRequest,
            ServiceRequestList,
            CreateReviewRequest,
            UpdateReviewRequest,
            ReviewList,
            ReviewWithWorkshop,
            MechanicList,
            ChatTurn,
            ChatRequest,
            ChatReply,
            params::Pagination,
            Meta,
            ApiResponse<User>,
            ApiResponse<Profile>,
            ApiResponse<Workshop>,
            ApiResponse<WorkshopList>,
            ApiResponse<ServiceRequest>,
            ApiResponse<ServiceRequestList>,
            ApiResponse<ReviewWithWorkshop>,
            ApiResponse<ReviewList>,
            ApiResponse<MechanicList>,
            ApiResponse<ChatReply>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Me", description = "Current user and profile"),
        (name = "Workshops", description = "Workshop directory and management"),
        (name = "Service requests", description = "Service request lifecycle"),
        (name = "Reviews", description = "Workshop reviews and ratings"),
        (name = "Mechanics", description = "Public mechanics directory"),
        (name = "Chatbot", description = "Automotive assistant proxy"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
