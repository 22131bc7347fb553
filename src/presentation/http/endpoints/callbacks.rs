use std::sync::Arc;

use poem::{Result as PoemResult, http::StatusCode};
use poem_openapi::{OpenApi, payload::Json};
use tracing::{error, warn};

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    requests::DueCallbackDto,
    responses::CallbackAckDto,
};

pub struct CallbackEndpoints {
    state: Arc<ApiState>,
}

impl CallbackEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl CallbackEndpoints {
    /// Due-time entry point for the external queue. The token is verified
    /// before anything is touched; a bad signature mutates nothing. A non-2xx
    /// answer makes the queue redeliver, which the dispatch guards absorb.
    #[oai(path = "/callbacks/due", method = "post", tag = EndpointsTags::Callbacks)]
    pub async fn due(&self, request: Json<DueCallbackDto>) -> PoemResult<Json<CallbackAckDto>> {
        let event = self.state.signer.verify(&request.token).map_err(|err| {
            warn!(error = %err, "rejected due callback");
            poem::Error::from_string("invalid callback signature", StatusCode::UNAUTHORIZED)
        })?;

        self.state.dispatcher.handle(event).await.map_err(|err| {
            error!(error = ?err, "due callback failed");
            poem::Error::from_string("dispatch failed", StatusCode::INTERNAL_SERVER_ERROR)
        })?;

        Ok(Json(CallbackAckDto {
            status: "accepted".to_string(),
        }))
    }
}
