use std::sync::Arc;

use sonda_core::ops::{FindOutcome, ListRequest, RequeueOutcome};
use sonda_core::{Inspector, LookupQuery};
use sonda_proto::sonda_inspect_server::SondaInspect;
use sonda_proto::{
    FindMessageRequest, FindMessageResponse, ListMessagesRequest, ListMessagesResponse,
    RequeueDeadLetterRequest, RequeueDeadLetterResponse,
};
use tonic::{Request, Response, Status};
use tracing::instrument;

use crate::convert::{message_info, sub_queue_from_proto, sub_queue_to_proto};
use crate::error::IntoStatus;

/// gRPC inspection service. Scans run on the blocking pool since the
/// transport is synchronous.
pub struct InspectService {
    inspector: Arc<Inspector>,
}

impl InspectService {
    pub fn new(inspector: Arc<Inspector>) -> Self {
        Self { inspector }
    }
}

fn lookup(message_id: String, order_number: String) -> LookupQuery {
    LookupQuery {
        message_id: Some(message_id),
        field_value: Some(order_number),
    }
}

#[tonic::async_trait]
impl SondaInspect for InspectService {
    #[instrument(skip_all)]
    async fn find_message(
        &self,
        request: Request<FindMessageRequest>,
    ) -> Result<Response<FindMessageResponse>, Status> {
        let req = request.into_inner();
        let sub_queue = sub_queue_from_proto(req.sub_queue());
        let query = lookup(req.message_id, req.order_number);
        let inspector = Arc::clone(&self.inspector);

        let outcome = tokio::task::spawn_blocking(move || {
            inspector.find_message(sub_queue, &query, req.max_to_scan)
        })
        .await
        .map_err(IntoStatus::into_status)?
        .map_err(IntoStatus::into_status)?;

        let response = match outcome {
            FindOutcome::Found(found) => FindMessageResponse {
                found: true,
                location: sub_queue_to_proto(found.location),
                message: Some(message_info(found.message, found.body)),
                max_to_scan: 0,
            },
            FindOutcome::NotFound { view, max_to_scan } => FindMessageResponse {
                found: false,
                location: sub_queue_to_proto(view.sub_queue),
                message: None,
                max_to_scan: u64::try_from(max_to_scan).unwrap_or(u64::MAX),
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip_all)]
    async fn list_messages(
        &self,
        request: Request<ListMessagesRequest>,
    ) -> Result<Response<ListMessagesResponse>, Status> {
        let req = request.into_inner();
        let list = ListRequest {
            sub_queue: Some(sub_queue_from_proto(req.sub_queue())),
            top: req.top,
            from_sequence: req.from_sequence,
            max_body: req.max_body,
        };
        let inspector = Arc::clone(&self.inspector);

        let page = tokio::task::spawn_blocking(move || inspector.list_messages(&list))
            .await
            .map_err(IntoStatus::into_status)?
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(ListMessagesResponse {
            sub_queue: sub_queue_to_proto(page.sub_queue),
            count: u32::try_from(page.count).unwrap_or(u32::MAX),
            next_sequence_number: page.next_sequence_number,
            messages: page
                .items
                .into_iter()
                .map(|item| message_info(item.message, item.body))
                .collect(),
        }))
    }

    #[instrument(skip_all)]
    async fn requeue_dead_letter(
        &self,
        request: Request<RequeueDeadLetterRequest>,
    ) -> Result<Response<RequeueDeadLetterResponse>, Status> {
        let req = request.into_inner();
        let query = lookup(req.message_id, req.order_number);
        let inspector = Arc::clone(&self.inspector);

        let outcome = tokio::task::spawn_blocking(move || {
            inspector.requeue_from_dead_letter(&query, req.max_to_scan)
        })
        .await
        .map_err(IntoStatus::into_status)?
        .map_err(IntoStatus::into_status)?;

        let response = match outcome {
            RequeueOutcome::Requeued(receipt) => RequeueDeadLetterResponse {
                requeued: true,
                message_id: receipt.message_id,
                original_sequence: receipt.original_sequence,
                session_id: receipt.session_id.unwrap_or_default(),
                new_sequence: receipt.new_sequence,
                max_to_scan: 0,
            },
            RequeueOutcome::NotFound { max_to_scan } => RequeueDeadLetterResponse {
                requeued: false,
                max_to_scan: u64::try_from(max_to_scan).unwrap_or(u64::MAX),
                ..Default::default()
            },
        };
        Ok(Response::new(response))
    }
}
