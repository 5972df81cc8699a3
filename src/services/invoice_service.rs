// src/services/invoice_service.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::{field_error, AppError},
        validation::is_sequence_invoice_number,
    },
    db::{DealRepository, InvoiceRepository},
    models::{
        deal::{Deal, DealStage, InvoiceCandidate},
        invoice::{
            CreateInvoicePayload, Invoice, InvoiceDetail, InvoiceFilter, NewInvoice, PaymentStatus,
            UpdateInvoicePayload,
        },
    },
};

// Subpasta de MEDIA_ROOT onde ficam os PDFs das faturas
const INVOICE_UPLOAD_DIR: &str = "factures";

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const DUE_DAYS: u64 = 30;

// =============================================================================
//  ARITMÉTICA E NUMERAÇÃO
// =============================================================================

/// Valor com impostos: 20 % sobre o total, arredondado ao centavo.
pub fn tax_inclusive(total_excl_tax: Decimal) -> Decimal {
    (total_excl_tax * Decimal::new(120, 2)).round_dp(2)
}

// Negócio sem valor conta como zero
pub fn sum_amounts<'a>(deals: impl IntoIterator<Item = &'a Deal>) -> Decimal {
    deals.into_iter().filter_map(|d| d.amount).sum()
}

pub fn format_invoice_number(date: NaiveDate, sequence: i64) -> String {
    format!("FAC-{}-{:05}", date.format("%Y%m%d"), sequence)
}

/// Na edição, um número no formato da sequência só passa se já for o da fatura.
pub fn check_renumbering(requested: Option<&str>, current: &str) -> Result<(), AppError> {
    match requested.map(str::trim) {
        Some(number) if is_sequence_invoice_number(number) && number != current => {
            Err(field_error("invoice_number", "reserved_invoice_number"))
        }
        _ => Ok(()),
    }
}

pub fn default_due_date(invoice_date: NaiveDate) -> NaiveDate {
    invoice_date
        .checked_add_days(Days::new(DUE_DAYS))
        .unwrap_or(invoice_date)
}

/// Confere o lote travado: todos existem, são do comercial, estão ganhos
/// e ainda não têm fatura.
pub fn check_invoice_candidates(requested: &[Uuid], candidates: &[InvoiceCandidate]) -> Result<(), AppError> {
    if candidates.len() != requested.len() || candidates.iter().any(|c| !c.owned) {
        return Err(field_error("deal_ids", "deal_not_owned"));
    }
    if candidates.iter().any(|c| c.deal.stage != DealStage::Gagne) {
        return Err(field_error("deal_ids", "deal_not_won"));
    }
    if candidates.iter().any(|c| c.deal.invoice_id.is_some()) {
        return Err(field_error("deal_ids", "deal_already_invoiced"));
    }
    Ok(())
}

/// Nome seguro para o disco: só o nome final, sem separadores nem caracteres exóticos.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

// Distribui os negócios carregados em lote pelas suas faturas
fn attach_deals(invoices: Vec<Invoice>, deals: Vec<Deal>) -> Vec<InvoiceDetail> {
    let mut by_invoice: HashMap<Uuid, Vec<Deal>> = HashMap::new();
    for deal in deals {
        if let Some(invoice_id) = deal.invoice_id {
            by_invoice.entry(invoice_id).or_default().push(deal);
        }
    }
    invoices
        .into_iter()
        .map(|invoice| {
            let deals = by_invoice.remove(&invoice.id).unwrap_or_default();
            InvoiceDetail { invoice, deals }
        })
        .collect()
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct InvoiceService {
    invoice_repo: InvoiceRepository,
    deal_repo: DealRepository,
    pool: PgPool,
    media_root: PathBuf,
}

impl InvoiceService {
    pub fn new(
        invoice_repo: InvoiceRepository,
        deal_repo: DealRepository,
        pool: PgPool,
        media_root: PathBuf,
    ) -> Self {
        Self { invoice_repo, deal_repo, pool, media_root }
    }

    pub async fn list_invoices(&self, user_id: Uuid, filter: &InvoiceFilter) -> Result<Vec<InvoiceDetail>, AppError> {
        let invoices = self.invoice_repo.list(user_id, filter).await?;
        let ids: Vec<Uuid> = invoices.iter().map(|i| i.id).collect();
        let deals = self.deal_repo.list_by_invoices(&self.pool, &ids).await?;
        Ok(attach_deals(invoices, deals))
    }

    pub async fn get_invoice(&self, user_id: Uuid, id: Uuid) -> Result<InvoiceDetail, AppError> {
        let invoice = self.invoice_repo
            .find_owned(&self.pool, user_id, id)
            .await?
            .ok_or(AppError::NotFound("invoice_not_found"))?;
        self.with_deals(invoice).await
    }

    async fn with_deals(&self, invoice: Invoice) -> Result<InvoiceDetail, AppError> {
        let deals = self.deal_repo.list_by_invoices(&self.pool, &[invoice.id]).await?;
        Ok(InvoiceDetail { invoice, deals })
    }

    /// Criação manual. Sem número, puxa um da sequência; sem TTC, aplica os 20 %.
    pub async fn create_invoice(&self, user_id: Uuid, payload: &CreateInvoicePayload) -> Result<InvoiceDetail, AppError> {
        let amount_excl_tax = payload
            .amount_excl_tax
            .ok_or_else(|| field_error("amount_excl_tax", "required"))?;
        let invoice_date = payload.invoice_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.pool.begin().await?;

        let invoice_number = match payload.invoice_number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => number.to_string(),
            _ => {
                let sequence = self.invoice_repo.next_sequence(&mut *tx).await?;
                format_invoice_number(invoice_date, sequence)
            }
        };

        let new_invoice = NewInvoice {
            salesperson_id: user_id,
            invoice_number,
            amount_excl_tax,
            amount_incl_tax: payload.amount_incl_tax.unwrap_or_else(|| tax_inclusive(amount_excl_tax)),
            invoice_date,
            due_date: payload.due_date.unwrap_or_else(|| default_due_date(invoice_date)),
            payment_status: payload.payment_status.unwrap_or_default(),
        };
        let invoice = self.invoice_repo.create(&mut *tx, &new_invoice).await?;

        tx.commit().await?;

        tracing::info!("🧾 Fatura {} criada manualmente ({})", invoice.invoice_number, invoice.id);
        Ok(InvoiceDetail { invoice, deals: Vec::new() })
    }

    /// LÓGICA DE NEGÓCIO: fatura em lote. Trava os negócios, confere o lote,
    /// soma, numera e anexa tudo numa única transação.
    pub async fn create_from_deals(&self, user_id: Uuid, deal_ids: &[Uuid]) -> Result<InvoiceDetail, AppError> {
        let mut ids = deal_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Err(field_error("deal_ids", "deal_ids_required"));
        }

        let mut tx = self.pool.begin().await?;

        let candidates = self.deal_repo.lock_for_invoicing(&mut *tx, user_id, &ids).await?;
        check_invoice_candidates(&ids, &candidates)?;

        let amount_excl_tax = sum_amounts(candidates.iter().map(|c| &c.deal));
        let invoice_date = Utc::now().date_naive();
        let sequence = self.invoice_repo.next_sequence(&mut *tx).await?;

        let new_invoice = NewInvoice {
            salesperson_id: user_id,
            invoice_number: format_invoice_number(invoice_date, sequence),
            amount_excl_tax,
            amount_incl_tax: tax_inclusive(amount_excl_tax),
            invoice_date,
            due_date: default_due_date(invoice_date),
            payment_status: PaymentStatus::Pending,
        };
        let invoice = self.invoice_repo.create(&mut *tx, &new_invoice).await?;

        let attached = self.deal_repo.attach_invoice(&mut *tx, invoice.id, &ids).await?;
        if attached != ids.len() as u64 {
            // Linhas travadas: só acontece se o lote mudou por fora da transação
            return Err(field_error("deal_ids", "deal_already_invoiced"));
        }

        let deals = self.deal_repo.list_by_invoices(&mut *tx, &[invoice.id]).await?;

        tx.commit().await?;

        tracing::info!(
            "🧾 Fatura {} gerada a partir de {} negócios (HT {} / TTC {})",
            invoice.invoice_number,
            deals.len(),
            invoice.amount_excl_tax,
            invoice.amount_incl_tax
        );
        Ok(InvoiceDetail { invoice, deals })
    }

    pub async fn update_invoice(
        &self,
        user_id: Uuid,
        id: Uuid,
        payload: &UpdateInvoicePayload,
    ) -> Result<InvoiceDetail, AppError> {
        if payload.invoice_number.is_some() {
            let current = self.invoice_repo
                .find_owned(&self.pool, user_id, id)
                .await?
                .ok_or(AppError::NotFound("invoice_not_found"))?;
            check_renumbering(payload.invoice_number.as_deref(), &current.invoice_number)?;
        }

        let invoice = self.invoice_repo
            .update(user_id, id, payload)
            .await?
            .ok_or(AppError::NotFound("invoice_not_found"))?;
        self.with_deals(invoice).await
    }

    pub async fn delete_invoice(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let invoice = self.invoice_repo
            .delete_owned(user_id, id)
            .await?
            .ok_or(AppError::NotFound("invoice_not_found"))?;

        if let Some(path) = invoice.file_path.as_deref() {
            self.remove_stored_file(path).await;
        }
        Ok(())
    }

    /// Grava o arquivo em MEDIA_ROOT/factures/ e substitui o anterior.
    pub async fn upload_file(
        &self,
        user_id: Uuid,
        id: Uuid,
        original_name: &str,
        data: &[u8],
    ) -> Result<InvoiceDetail, AppError> {
        if data.is_empty() {
            return Err(AppError::InvalidUpload("arquivo vazio".to_string()));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::InvalidUpload(format!("arquivo com {} bytes", data.len())));
        }

        let current = self.invoice_repo
            .find_owned(&self.pool, user_id, id)
            .await?
            .ok_or(AppError::NotFound("invoice_not_found"))?;

        let relative = format!("{}/{}_{}", INVOICE_UPLOAD_DIR, id, sanitize_file_name(original_name));
        let target = self.media_root.join(&relative);

        tokio::fs::create_dir_all(self.media_root.join(INVOICE_UPLOAD_DIR)).await?;
        tokio::fs::write(&target, data).await?;

        let invoice = self.invoice_repo
            .set_file_path(user_id, id, &relative)
            .await?
            .ok_or(AppError::NotFound("invoice_not_found"))?;

        if let Some(previous) = current.file_path.as_deref().filter(|p| *p != relative) {
            self.remove_stored_file(previous).await;
        }

        tracing::info!("📎 Arquivo {} anexado à fatura {}", relative, id);
        self.with_deals(invoice).await
    }

    // Arquivo órfão não derruba a requisição
    async fn remove_stored_file(&self, relative: &str) {
        let path = self.media_root.join(Path::new(relative));
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Não foi possível apagar {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::deal::DealType;

    fn deal(amount: Option<Decimal>, stage: DealStage) -> Deal {
        let now = Utc::now();
        Deal {
            id: Uuid::new_v4(),
            relation_id: Uuid::new_v4(),
            invoice_id: None,
            name: "Contrat".to_string(),
            deal_type: DealType::OneShot,
            stage,
            amount,
            notes: None,
            commission_rate: None,
            won_at: None,
            client_paid_at: None,
            commission_paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn candidate(deal: Deal, owned: bool) -> InvoiceCandidate {
        InvoiceCandidate { deal, owned }
    }

    fn failing_code(result: Result<(), AppError>) -> String {
        match result {
            Err(AppError::ValidationError(errors)) => errors.field_errors()["deal_ids"][0].code.to_string(),
            other => panic!("esperava erro de validação, veio {:?}", other),
        }
    }

    #[test]
    fn bulk_invoice_arithmetic() {
        let deals = [
            deal(Some(Decimal::new(1000, 0)), DealStage::Gagne),
            deal(Some(Decimal::new(500, 0)), DealStage::Gagne),
            deal(None, DealStage::Gagne),
        ];
        let total = sum_amounts(deals.iter());
        assert_eq!(total, Decimal::new(1500, 0));
        assert_eq!(tax_inclusive(total), Decimal::new(1800, 0));
    }

    #[test]
    fn tax_rounds_to_cents() {
        assert_eq!(tax_inclusive(Decimal::new(1001, 3)), Decimal::new(120, 2));
        assert_eq!(tax_inclusive(Decimal::new(3333, 2)), Decimal::new(4000, 2));
    }

    #[test]
    fn renumbering_keeps_sequence_values_for_the_sequence() {
        assert!(check_renumbering(Some("FAC-20250307-00042"), "FAC-20250307-00042").is_ok());
        assert!(check_renumbering(Some("F-MANUEL-7"), "FAC-20250307-00042").is_ok());
        assert!(check_renumbering(None, "F-1").is_ok());
        let err = check_renumbering(Some("FAC-20990101-00099"), "F-1").unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn invoice_number_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(format_invoice_number(date, 42), "FAC-20250307-00042");
        assert_eq!(format_invoice_number(date, 123456), "FAC-20250307-123456");
    }

    #[test]
    fn due_date_is_thirty_days_later() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(default_due_date(date), NaiveDate::from_ymd_opt(2025, 2, 14).unwrap());
    }

    #[test]
    fn batch_with_missing_or_foreign_deal_is_rejected() {
        let mine = deal(Some(Decimal::ONE), DealStage::Gagne);
        let requested = [mine.id, Uuid::new_v4()];
        let missing = vec![candidate(mine.clone(), true)];
        assert_eq!(failing_code(check_invoice_candidates(&requested, &missing)), "deal_not_owned");

        let foreign = vec![candidate(mine.clone(), false)];
        assert_eq!(failing_code(check_invoice_candidates(&[mine.id], &foreign)), "deal_not_owned");
    }

    #[test]
    fn batch_requires_won_and_uninvoiced_deals() {
        let open = deal(Some(Decimal::ONE), DealStage::Negociation);
        assert_eq!(
            failing_code(check_invoice_candidates(&[open.id], &[candidate(open.clone(), true)])),
            "deal_not_won"
        );

        let mut invoiced = deal(Some(Decimal::ONE), DealStage::Gagne);
        invoiced.invoice_id = Some(Uuid::new_v4());
        assert_eq!(
            failing_code(check_invoice_candidates(&[invoiced.id], &[candidate(invoiced.clone(), true)])),
            "deal_already_invoiced"
        );

        let ok = deal(Some(Decimal::ONE), DealStage::Gagne);
        assert!(check_invoice_candidates(&[ok.id], &[candidate(ok.clone(), true)]).is_ok());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\facture mars.pdf"), "facture_mars.pdf");
        assert_eq!(sanitize_file_name(".."), "document");
        assert_eq!(sanitize_file_name(""), "document");
    }

    #[test]
    fn deals_are_grouped_by_invoice() {
        let now = Utc::now();
        let invoice = Invoice {
            id: Uuid::new_v4(),
            salesperson_id: Uuid::new_v4(),
            invoice_number: "FAC-20250101-00001".to_string(),
            amount_excl_tax: Decimal::ONE,
            amount_incl_tax: Decimal::ONE,
            invoice_date: now.date_naive(),
            due_date: None,
            payment_status: PaymentStatus::Pending,
            file_path: None,
            created_at: now,
            updated_at: now,
        };
        let mut attached = deal(None, DealStage::Gagne);
        attached.invoice_id = Some(invoice.id);
        let mut other = deal(None, DealStage::Gagne);
        other.invoice_id = Some(Uuid::new_v4());

        let details = attach_deals(vec![invoice], vec![attached.clone(), other]);
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].deals.len(), 1);
        assert_eq!(details[0].deals[0].id, attached.id);
    }

    // Banco real (DATABASE_URL)

    use serde_json::json;

    use crate::test_support::{count, db_state, field_code, http_status, lead, offer, payload, signup};

    #[tokio::test]
    async fn bulk_invoice_is_all_or_nothing() {
        let Some(state) = db_state().await else { return };
        let alice = signup(&state).await;
        let catalog = offer(&state, "one_shot").await;
        let (_, relation) = lead(&state, &alice, &catalog).await;

        let mut ids = Vec::new();
        for amount in [1500, 1800, 900] {
            let deal = state
                .deal_service
                .create_deal(
                    alice.id,
                    &payload(json!({ "relation_id": relation.id, "name": "Contrat", "stage": "gagne", "amount": amount })),
                )
                .await
                .unwrap();
            ids.push(deal.deal.id);
        }

        let detail = state.invoice_service.create_from_deals(alice.id, &ids[..2]).await.unwrap();
        assert_eq!(detail.invoice.amount_excl_tax, Decimal::new(3300, 0));
        assert_eq!(detail.invoice.amount_incl_tax, Decimal::new(396000, 2));
        assert_eq!(detail.invoice.due_date, Some(default_due_date(detail.invoice.invoice_date)));
        assert!(detail.invoice.invoice_number.starts_with("FAC-"));
        assert_eq!(detail.deals.len(), 2);

        // Um negócio já faturado derruba o lote inteiro
        let before = count(&state, "SELECT COUNT(*) FROM invoices WHERE salesperson_id = $1", alice.id).await;
        let err = state.invoice_service.create_from_deals(alice.id, &[ids[1], ids[2]]).await.unwrap_err();
        assert_eq!(field_code(&err, "deal_ids").as_deref(), Some("deal_already_invoiced"));
        assert_eq!(http_status(&err, &state), 400);

        let after = count(&state, "SELECT COUNT(*) FROM invoices WHERE salesperson_id = $1", alice.id).await;
        assert_eq!(before, after);
        let untouched = state.deal_service.get_deal(alice.id, ids[2]).await.unwrap();
        assert_eq!(untouched.deal.invoice_id, None);
        let still_first = state.deal_service.get_deal(alice.id, ids[1]).await.unwrap();
        assert_eq!(still_first.deal.invoice_id, Some(detail.invoice.id));
    }

    #[tokio::test]
    async fn invoices_of_others_are_not_found() {
        let Some(state) = db_state().await else { return };
        let (alice, bob) = (signup(&state).await, signup(&state).await);
        let created = state
            .invoice_service
            .create_invoice(alice.id, &payload(json!({ "amount_excl_tax": 100 })))
            .await
            .unwrap();
        let id = created.invoice.id;

        let err = state.invoice_service.get_invoice(bob.id, id).await.unwrap_err();
        assert_eq!(http_status(&err, &state), 404);
        let patch: UpdateInvoicePayload = payload(json!({ "payment_status": "paid" }));
        assert!(matches!(state.invoice_service.update_invoice(bob.id, id, &patch).await, Err(AppError::NotFound(_))));
        assert!(matches!(state.invoice_service.delete_invoice(bob.id, id).await, Err(AppError::NotFound(_))));

        let kept = state.invoice_service.get_invoice(alice.id, id).await.unwrap();
        assert_eq!(kept.invoice.payment_status, PaymentStatus::Pending);
    }
}
