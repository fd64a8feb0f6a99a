//! OpenAPI document

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use crate::handlers::extraction::{ExtractionResultResponse, MaterializeResponse};
use hakobu_core::models::{
    AccessTokenResponse, AssignDriverRequest, AssignmentResponse, AssignmentStatus,
    CreateDeliveryRequestRequest, DeliveryRequestResponse, DeliveryStatus,
    DriverAssignmentStatus, DriverProfileResponse, ExtractionStatus, FileCategory,
    FileUploadResponse, LoginRequest, RefreshRequest, RegisterRequest, SetDriverRewardRequest,
    TokenResponse, UpdateAssignmentStatusRequest, UpdateDeliveryRequestRequest,
    UpdateDriverProfileRequest, UpdateProfileRequest, UpdateRequestStatusRequest, UserResponse,
    UserRole, VehicleType,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::users::get_profile,
        handlers::users::update_profile,
        handlers::users::get_driver_profile,
        handlers::users::update_driver_profile,
        handlers::users::available_drivers,
        handlers::users::all_drivers,
        handlers::users::delete_driver,
        handlers::deliveries::list_requests,
        handlers::deliveries::create_request,
        handlers::deliveries::get_request,
        handlers::deliveries::update_request,
        handlers::deliveries::delete_request,
        handlers::deliveries::accept_request,
        handlers::deliveries::set_driver_reward,
        handlers::deliveries::assign_driver,
        handlers::deliveries::update_request_status,
        handlers::assignments::list_assignments,
        handlers::assignments::update_assignment_status,
        handlers::uploads::list_uploads,
        handlers::uploads::upload_file,
        handlers::uploads::get_upload,
        handlers::uploads::delete_upload,
        handlers::uploads::download_file,
        handlers::extraction::extract_document,
        handlers::extraction::create_delivery_from_upload,
    ),
    components(schemas(
        ErrorResponse,
        RegisterRequest,
        LoginRequest,
        RefreshRequest,
        TokenResponse,
        AccessTokenResponse,
        UserResponse,
        UserRole,
        VehicleType,
        UpdateProfileRequest,
        DriverProfileResponse,
        UpdateDriverProfileRequest,
        DeliveryRequestResponse,
        DeliveryStatus,
        CreateDeliveryRequestRequest,
        UpdateDeliveryRequestRequest,
        UpdateRequestStatusRequest,
        SetDriverRewardRequest,
        AssignDriverRequest,
        AssignmentResponse,
        AssignmentStatus,
        DriverAssignmentStatus,
        UpdateAssignmentStatusRequest,
        FileUploadResponse,
        FileCategory,
        ExtractionStatus,
        ExtractionResultResponse,
        MaterializeResponse,
    )),
    tags(
        (name = "auth", description = "Registration and token endpoints"),
        (name = "users", description = "Profiles and driver management"),
        (name = "deliveries", description = "Delivery requests and assignments"),
        (name = "files", description = "Document upload and extraction"),
    ),
    info(
        title = "hakobu API",
        description = "Delivery-brokering backend with document extraction",
    )
)]
pub struct ApiDoc;
