use std::pin::Pin;

use futures_core::stream::Stream;
use inkpress_core::{
    cancel::CancelHandle,
    error::{InkpressError, Result},
    provider::{ChatCompleteParameters, StreamingChatProvider},
};

use crate::{OpenAiAdapter, api_v1::ChatCompletionRequest, profile::profile_for};

impl StreamingChatProvider for OpenAiAdapter {
    type Delta<'s>
        = Pin<Box<dyn Stream<Item = Result<String>> + Send + 's>>
    where
        Self: 's;

    fn chat_complete_stream<'s>(
        &'s self,
        params: ChatCompleteParameters,
        cancel: CancelHandle,
    ) -> Self::Delta<'s> {
        let client = self.client.clone();

        Box::pin(async_stream::try_stream! {
            use futures_util::StreamExt;

            let profile = profile_for(&params.endpoint.provider_id);
            let endpoint = params.endpoint.clone();
            let request: ChatCompletionRequest = params.try_into()?;

            let stream = client.chat_completion_stream(endpoint, request, profile, cancel);
            futures_util::pin_mut!(stream);

            while let Some(token) = stream.next().await {
                let token = token.map_err(InkpressError::from)?;
                yield token;
            }
        })
    }
}
