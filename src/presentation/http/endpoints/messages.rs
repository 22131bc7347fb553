use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, param::Query, payload::Json};
use uuid::Uuid;

use crate::{
    application::usecases::{
        edit_message::EditMessageRequest, schedule_message::ScheduleMessageRequest,
    },
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags, map_domain_error},
        mappers::{map_attempt, map_message, map_recipient_choices, map_schedule_input},
        requests::ComposeMessageRequestDto,
        responses::{DeliveryAttemptDto, MessageDto, MessageIdResponseDto, PaginatedMessagesDto},
        security::JwtAuth,
    },
};

pub struct MessagesEndpoints {
    state: Arc<ApiState>,
}

impl MessagesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl MessagesEndpoints {
    #[oai(path = "/messages", method = "post", tag = EndpointsTags::Messages)]
    pub async fn compose_message(
        &self,
        auth: JwtAuth,
        request: Json<ComposeMessageRequestDto>,
    ) -> PoemResult<Json<MessageIdResponseDto>> {
        let user = auth.into_user(&self.state.auth_config)?;
        let payload = ScheduleMessageRequest {
            user_id: user.user_id,
            group_id: request.group_id,
            subject: request.subject.clone(),
            body: request.body.clone(),
            schedule: map_schedule_input(&request),
            chosen_recipients: map_recipient_choices(&request),
            save_as_draft: request.save_as_draft,
        };

        let response = self
            .state
            .schedule_message_usecase
            .execute(payload)
            .await
            .map_err(map_domain_error)?;

        Ok(Json(MessageIdResponseDto {
            message_id: response.message_id,
        }))
    }

    #[oai(path = "/messages", method = "get", tag = EndpointsTags::Messages)]
    pub async fn list_messages(
        &self,
        auth: JwtAuth,
        limit: Query<Option<u32>>,
        offset: Query<Option<u32>>,
    ) -> PoemResult<Json<PaginatedMessagesDto>> {
        let user = auth.into_user(&self.state.auth_config)?;

        let result = self
            .state
            .list_messages_usecase
            .execute(user.user_id, limit.0, offset.0)
            .await
            .map_err(map_domain_error)?;

        Ok(Json(PaginatedMessagesDto {
            messages: result.messages.iter().map(map_message).collect(),
            has_more: result.has_more,
            next_offset: result.next_offset,
        }))
    }

    #[oai(path = "/messages/:message_id", method = "get", tag = EndpointsTags::Messages)]
    pub async fn get_message(
        &self,
        auth: JwtAuth,
        message_id: Path<Uuid>,
    ) -> PoemResult<Json<MessageDto>> {
        let user = auth.into_user(&self.state.auth_config)?;

        let message = self
            .state
            .get_message_usecase
            .execute(message_id.0, user.user_id)
            .await
            .map_err(map_domain_error)?;

        Ok(Json(map_message(&message)))
    }

    #[oai(path = "/messages/:message_id", method = "put", tag = EndpointsTags::Messages)]
    pub async fn edit_message(
        &self,
        auth: JwtAuth,
        message_id: Path<Uuid>,
        request: Json<ComposeMessageRequestDto>,
    ) -> PoemResult<Json<MessageIdResponseDto>> {
        let user = auth.into_user(&self.state.auth_config)?;
        let payload = EditMessageRequest {
            user_id: user.user_id,
            message_id: message_id.0,
            subject: request.subject.clone(),
            body: request.body.clone(),
            schedule: map_schedule_input(&request),
            chosen_recipients: map_recipient_choices(&request),
            save_as_draft: request.save_as_draft,
        };

        self.state
            .edit_message_usecase
            .execute(payload)
            .await
            .map_err(map_domain_error)?;

        Ok(Json(MessageIdResponseDto {
            message_id: message_id.0,
        }))
    }

    #[oai(path = "/messages/:message_id", method = "delete", tag = EndpointsTags::Messages)]
    pub async fn delete_message(
        &self,
        auth: JwtAuth,
        message_id: Path<Uuid>,
    ) -> PoemResult<Json<MessageIdResponseDto>> {
        let user = auth.into_user(&self.state.auth_config)?;

        self.state
            .delete_message_usecase
            .execute(user.user_id, message_id.0)
            .await
            .map_err(map_domain_error)?;

        Ok(Json(MessageIdResponseDto {
            message_id: message_id.0,
        }))
    }

    #[oai(
        path = "/messages/:message_id/attempts",
        method = "get",
        tag = EndpointsTags::Messages
    )]
    pub async fn get_message_attempts(
        &self,
        auth: JwtAuth,
        message_id: Path<Uuid>,
    ) -> PoemResult<Json<Vec<DeliveryAttemptDto>>> {
        let user = auth.into_user(&self.state.auth_config)?;

        let attempts = self
            .state
            .get_message_attempts_usecase
            .execute(message_id.0, user.user_id)
            .await
            .map_err(map_domain_error)?;

        Ok(Json(attempts.iter().map(map_attempt).collect()))
    }
}
