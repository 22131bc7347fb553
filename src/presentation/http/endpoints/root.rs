use std::sync::Arc;

use poem::http::StatusCode;
use poem_openapi::Tags;
use tracing::error;

use crate::application::handlers::dispatcher::DispatchHandler;
use crate::application::services::signing::CallbackSigner;
use crate::application::usecases::{
    delete_message::DeleteMessageUseCase, edit_message::EditMessageUseCase,
    get_message::GetMessageUseCase, get_message_attempts::GetMessageAttemptsUseCase,
    list_messages::ListMessagesUseCase, schedule_message::ScheduleMessageUseCase,
};
use crate::domain::errors::DomainError;
use crate::presentation::http::security::AuthConfig;

pub struct ApiState {
    pub schedule_message_usecase: Arc<ScheduleMessageUseCase>,
    pub edit_message_usecase: Arc<EditMessageUseCase>,
    pub delete_message_usecase: Arc<DeleteMessageUseCase>,
    pub get_message_usecase: Arc<GetMessageUseCase>,
    pub list_messages_usecase: Arc<ListMessagesUseCase>,
    pub get_message_attempts_usecase: Arc<GetMessageAttemptsUseCase>,
    pub dispatcher: Arc<DispatchHandler>,
    pub signer: CallbackSigner,
    pub auth_config: AuthConfig,
}

#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Messages,
    Callbacks,
}

pub(crate) fn map_domain_error(err: DomainError) -> poem::Error {
    match err {
        DomainError::NotFound(msg) => poem::Error::from_string(msg, StatusCode::NOT_FOUND),
        DomainError::Forbidden(msg) => poem::Error::from_string(msg, StatusCode::FORBIDDEN),
        DomainError::Validation(err) => {
            poem::Error::from_string(err.to_string(), StatusCode::BAD_REQUEST)
        }
        DomainError::Other(err) => {
            error!(error = ?err, "request failed");
            poem::Error::from_string("internal error", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
