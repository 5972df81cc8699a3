// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_LANG: &str = "en";

// (chave, en, fr, pt)
const CATALOG: &[(&str, &str, &str, &str)] = &[
    ("validation_failed", "One or more fields are invalid.", "Un ou plusieurs champs sont invalides.", "Um ou mais campos são inválidos."),
    ("email_already_exists", "Email already used.", "Email déjà utilisé.", "Este e-mail já está em uso."),
    ("invalid_credentials", "Invalid email or password.", "Email ou mot de passe invalide.", "E-mail ou senha inválidos."),
    ("invalid_token", "Missing or invalid authentication token.", "Jeton d'authentification absent ou invalide.", "Token de autenticação inválido ou ausente."),
    ("user_not_found", "User not found.", "Utilisateur introuvable.", "Usuário não encontrado."),
    ("not_found", "Not found.", "Introuvable.", "Não encontrado."),
    ("internal_error", "An unexpected error occurred.", "Une erreur inattendue est survenue.", "Ocorreu um erro inesperado."),
    ("invalid_upload", "The uploaded file is invalid.", "Le fichier envoyé est invalide.", "O arquivo enviado é inválido."),
    ("required", "This field is required.", "Ce champ est obligatoire.", "Este campo é obrigatório."),
    ("length", "Invalid length.", "Longueur invalide.", "Tamanho inválido."),
    ("invalid_email", "Invalid email address.", "Adresse email invalide.", "E-mail inválido."),
    ("password_too_short", "Password must have at least 6 characters.", "Le mot de passe doit contenir au moins 6 caractères.", "A senha deve ter no mínimo 6 caracteres."),
    ("invalid_siret", "SIRET must contain exactly 9 digits.", "Le SIRET doit contenir exactement 9 chiffres.", "O SIRET deve conter exatamente 9 dígitos."),
    ("invalid_phone", "Invalid phone format.", "Format de téléphone invalide.", "Formato de telefone inválido."),
    ("invalid_rate", "Rate must be between 0 and 100.", "Le taux doit être compris entre 0 et 100.", "A taxa deve estar entre 0 e 100."),
    ("negative_amount", "Amount cannot be negative.", "Le montant ne peut pas être négatif.", "O valor não pode ser negativo."),
    ("duplicate_lead_email", "A lead with this email already exists.", "Un lead avec cet email existe déjà.", "Já existe um lead com este e-mail."),
    ("offer_inactive", "This offer does not exist or is not active.", "Cette offre n'existe pas ou n'est pas active.", "Esta oferta não existe ou não está ativa."),
    ("lead_not_owned", "You do not have access to this lead.", "Vous n'avez pas accès à ce lead.", "Você não tem acesso a este lead."),
    ("relation_not_owned", "You do not have access to this relation.", "Vous n'avez pas accès à cette relation.", "Você não tem acesso a esta relação."),
    ("duplicate_relation", "This relation already exists.", "Cette relation existe déjà.", "Esta relação já existe."),
    ("deal_not_owned", "You do not have access to this deal.", "Vous n'avez pas accès à ce deal.", "Você não tem acesso a este negócio."),
    ("deal_ids_required", "Select at least one deal.", "Sélectionnez au moins un deal.", "Selecione ao menos um negócio."),
    ("deal_not_won", "Only won deals can be invoiced.", "Seuls les deals gagnés peuvent être facturés.", "Apenas negócios ganhos podem ser faturados."),
    ("deal_already_invoiced", "A selected deal is already invoiced.", "Un deal sélectionné est déjà facturé.", "Um negócio selecionado já foi faturado."),
    ("duplicate_invoice_number", "This invoice number already exists.", "Ce numéro de facture existe déjà.", "Este número de fatura já existe."),
    ("reserved_invoice_number", "Numbers in the FAC-YYYYMMDD-N format are reserved for automatic numbering.", "Les numéros au format FAC-AAAAMMJJ-N sont réservés à la numérotation automatique.", "Números no formato FAC-AAAAMMDD-N são reservados à numeração automática."),
    ("invalid_transition", "This status change is not allowed.", "Ce changement de statut n'est pas autorisé.", "Esta mudança de status não é permitida."),
    ("lead_not_found", "Lead not found.", "Lead introuvable.", "Lead não encontrado."),
    ("offer_not_found", "Offer not found.", "Offre introuvable.", "Oferta não encontrada."),
    ("relation_not_found", "Relation not found.", "Relation introuvable.", "Relação não encontrada."),
    ("deal_not_found", "Deal not found.", "Deal introuvable.", "Negócio não encontrado."),
    ("invoice_not_found", "Invoice not found.", "Facture introuvable.", "Fatura não encontrada."),
    ("action_not_found", "Action not found.", "Action introuvable.", "Ação não encontrada."),
    ("commission_not_found", "Commission not found.", "Commission introuvable.", "Comissão não encontrada."),
];

/// Catálogo de mensagens em memória, compartilhado pelo `AppState`.
#[derive(Clone)]
pub struct I18nStore {
    // idioma -> (chave -> mensagem)
    messages: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl I18nStore {
    pub fn load() -> Self {
        let mut messages: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();
        for &(key, en, fr, pt) in CATALOG {
            messages.entry("en").or_default().insert(key, en);
            messages.entry("fr").or_default().insert(key, fr);
            messages.entry("pt").or_default().insert(key, pt);
        }
        Self { messages: Arc::new(messages) }
    }

    /// Idioma desconhecido cai para inglês; chave desconhecida é devolvida como veio.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        let lookup = |l: &str| self.messages.get(l).and_then(|m| m.get(key));
        lookup(lang)
            .or_else(|| lookup(DEFAULT_LANG))
            .map(|m| m.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_known_languages() {
        let store = I18nStore::load();
        assert_eq!(store.translate("fr", "lead_not_found"), "Lead introuvable.");
        assert_eq!(store.translate("pt", "lead_not_found"), "Lead não encontrado.");
    }

    #[test]
    fn falls_back_to_english_then_key() {
        let store = I18nStore::load();
        assert_eq!(store.translate("de", "not_found"), "Not found.");
        assert_eq!(store.translate("fr", "some_unknown_key"), "some_unknown_key");
    }
}
