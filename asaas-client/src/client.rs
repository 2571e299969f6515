//! Asaas REST client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use loyalty_core::gateway::{Charge, GatewayError, NewCharge, PaymentGateway, PixPayload};
use shared::document::TaxId;

use crate::config::AsaasConfig;
use crate::types::{
    CreatePaymentBody, CustomerDto, ErrorBody, ListResponse, PaymentDto, PixQrCodeDto,
};

#[derive(Debug, Clone)]
pub struct AsaasClient {
    client: Client,
    base_url: String,
    api_key: String,
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_decode() {
        GatewayError::InvalidResponse(err.to_string())
    } else {
        GatewayError::Network(err.to_string())
    }
}

impl AsaasClient {
    pub fn new(config: &AsaasConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/{}", self.base_url, path))
            .header("access_token", &self.api_key)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.base_url, path))
            .header("access_token", &self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, path: &str) -> Result<T, GatewayError> {
        let response = req.send().await.map_err(|e| {
            tracing::error!(path = %path, error = %e, "Asaas request failed");
            transport_error(e)
        })?;
        self.handle_response(response, path).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        path: &str,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        // Asaas reports validation problems as an `errors` array, sometimes
        // with a 2xx status
        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            let reasons = body.descriptions();
            tracing::warn!(path = %path, status = %status, reasons = ?reasons, "Asaas rejected request");
            if status == StatusCode::NOT_FOUND && reasons.is_empty() {
                return Err(GatewayError::NotFound(path.to_string()));
            }
            return Err(GatewayError::Rejected(reasons));
        }

        if !status.is_success() {
            tracing::warn!(path = %path, status = %status, "Asaas returned an error status");
            return match status {
                StatusCode::NOT_FOUND => Err(GatewayError::NotFound(path.to_string())),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(
                    GatewayError::InvalidResponse(format!("authentication refused ({status})")),
                ),
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Err(GatewayError::Timeout),
                s if s.is_server_error() => Err(GatewayError::Network(format!("upstream status {s}"))),
                _ => Err(GatewayError::Rejected(Vec::new())),
            };
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(path = %path, error = %e, "Unexpected Asaas response body");
            GatewayError::InvalidResponse(e.to_string())
        })
    }
}

#[async_trait]
impl PaymentGateway for AsaasClient {
    async fn find_customer_by_tax_id(&self, tax_id: &TaxId) -> Result<Option<String>, GatewayError> {
        let req = self.get("customers").query(&[("cpfCnpj", tax_id.digits())]);
        let list: ListResponse<CustomerDto> = self.send(req, "customers").await?;
        Ok(list.data.into_iter().next().map(|c| c.id))
    }

    async fn find_charge_by_reference(
        &self,
        external_reference: &str,
    ) -> Result<Option<Charge>, GatewayError> {
        let req = self
            .get("payments")
            .query(&[("externalReference", external_reference)]);
        let list: ListResponse<PaymentDto> = self.send(req, "payments").await?;
        Ok(list
            .data
            .into_iter()
            .find(|p| !p.deleted)
            .map(Charge::from))
    }

    async fn find_charge(&self, charge_id: &str) -> Result<Option<Charge>, GatewayError> {
        let path = format!("payments/{charge_id}");
        match self.send::<PaymentDto>(self.get(&path), &path).await {
            Ok(payment) if payment.deleted => Ok(None),
            Ok(payment) => Ok(Some(payment.into())),
            Err(GatewayError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_charge(&self, charge: &NewCharge) -> Result<Charge, GatewayError> {
        let body = CreatePaymentBody {
            customer: &charge.customer_id,
            billing_type: charge.method.as_str(),
            value: charge.amount.amount(),
            due_date: charge.due_date,
            description: &charge.description,
            external_reference: &charge.external_reference,
        };
        let mut req = self.post("payments").json(&body);
        if let Some(key) = &charge.idempotency_key {
            req = req.header("Idempotency-Key", key);
        }

        let payment: PaymentDto = self.send(req, "payments").await?;
        tracing::debug!(charge_id = %payment.id, status = %payment.status, "Asaas payment created");
        Ok(payment.into())
    }

    async fn pix_payload(&self, charge_id: &str) -> Result<PixPayload, GatewayError> {
        let path = format!("payments/{charge_id}/pixQrCode");
        let qr: PixQrCodeDto = self.send(self.get(&path), &path).await?;
        Ok(qr.into())
    }
}
