use std::sync::Arc;

use sonda_core::ops::{SendOptions, SendReceipt};
use sonda_core::{PublishError, Publisher};
use sonda_proto::sonda_publish_server::SondaPublish;
use sonda_proto::{
    CloseSessionRequest, CloseSessionResponse, ScheduleSendRequest, ScheduleSendResponse,
    SendOrderRequest, SendOrderResponse, SendSessionMessageRequest, SendSessionMessageResponse,
};
use tonic::{Request, Response, Status};
use tracing::instrument;

use crate::error::IntoStatus;

/// gRPC publish service.
pub struct PublishService {
    publisher: Arc<Publisher>,
}

impl PublishService {
    pub fn new(publisher: Arc<Publisher>) -> Self {
        Self { publisher }
    }
}

#[tonic::async_trait]
impl SondaPublish for PublishService {
    #[instrument(skip_all)]
    async fn send_order(
        &self,
        request: Request<SendOrderRequest>,
    ) -> Result<Response<SendOrderResponse>, Status> {
        let req = request.into_inner();
        let publisher = Arc::clone(&self.publisher);

        let response = tokio::task::spawn_blocking(move || -> Result<_, PublishError> {
            if !req.enriched {
                let sequence_number = publisher.send_order(&req.body)?;
                return Ok(SendOrderResponse {
                    sequence_number,
                    ..Default::default()
                });
            }
            let options = SendOptions {
                ttl_seconds: req.ttl_seconds,
                schedule_in_seconds: req.schedule_in_seconds,
            };
            Ok(match publisher.send_enriched_order(&req.body, options)? {
                SendReceipt::Sent {
                    message_id,
                    sequence_number,
                    ttl_seconds,
                } => SendOrderResponse {
                    sequence_number,
                    message_id,
                    ttl_seconds: ttl_seconds.unwrap_or_default(),
                    ..Default::default()
                },
                SendReceipt::Scheduled {
                    message_id,
                    sequence_number,
                    scheduled_enqueue_at,
                    ttl_seconds,
                } => SendOrderResponse {
                    sequence_number,
                    message_id,
                    scheduled: true,
                    scheduled_enqueue_at_ms: scheduled_enqueue_at,
                    ttl_seconds: ttl_seconds.unwrap_or_default(),
                },
            })
        })
        .await
        .map_err(IntoStatus::into_status)?
        .map_err(IntoStatus::into_status)?;

        Ok(Response::new(response))
    }

    #[instrument(skip_all)]
    async fn schedule_send(
        &self,
        request: Request<ScheduleSendRequest>,
    ) -> Result<Response<ScheduleSendResponse>, Status> {
        let req = request.into_inner();
        let publisher = Arc::clone(&self.publisher);

        let receipt = tokio::task::spawn_blocking(move || {
            publisher.schedule_send(&req.body, req.schedule_in_seconds)
        })
        .await
        .map_err(IntoStatus::into_status)?
        .map_err(IntoStatus::into_status)?;

        Ok(Response::new(ScheduleSendResponse {
            sequence_number: receipt.sequence_number,
            scheduled_enqueue_at_ms: receipt.scheduled_enqueue_at,
        }))
    }

    #[instrument(skip_all)]
    async fn send_session_message(
        &self,
        request: Request<SendSessionMessageRequest>,
    ) -> Result<Response<SendSessionMessageResponse>, Status> {
        let req = request.into_inner();
        let publisher = Arc::clone(&self.publisher);

        let receipt = tokio::task::spawn_blocking(move || {
            publisher.send_session_message(&req.session_id, &req.body)
        })
        .await
        .map_err(IntoStatus::into_status)?
        .map_err(IntoStatus::into_status)?;

        Ok(Response::new(SendSessionMessageResponse {
            session_id: receipt.session_id,
            sequence_number: receipt.sequence_number,
        }))
    }

    #[instrument(skip_all)]
    async fn close_session(
        &self,
        request: Request<CloseSessionRequest>,
    ) -> Result<Response<CloseSessionResponse>, Status> {
        let session_id = request.into_inner().session_id;
        let publisher = Arc::clone(&self.publisher);

        let closed = session_id.clone();
        tokio::task::spawn_blocking(move || publisher.close_session(&closed))
            .await
            .map_err(IntoStatus::into_status)?
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(CloseSessionResponse { session_id }))
    }
}
