use std::{future::Future, pin::Pin};

use inkpress_core::{
    error::Result,
    provider::{ChatCompleteParameters, ChatCompletionProvider},
};

use crate::{OpenAiAdapter, api_v1::ChatCompletionRequest, profile::profile_for};

impl ChatCompletionProvider for OpenAiAdapter {
    fn chat_complete<'p>(
        &'p self,
        params: ChatCompleteParameters,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'p>> {
        Box::pin(async move {
            let profile = profile_for(&params.endpoint.provider_id);
            let endpoint = params.endpoint.clone();
            let request = ChatCompletionRequest::try_from(params)?;

            let response = self
                .client
                .chat_completion(&endpoint, request, profile)
                .await?;

            Ok(profile.final_content(&response))
        })
    }
}
