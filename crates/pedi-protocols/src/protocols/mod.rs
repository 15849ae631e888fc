//! The built-in protocol catalog.
//!
//! One module per clinical condition, each exposing `definition()`. The
//! order of [`all_protocols`] is the order the catalog is listed in.

pub mod common;

pub mod anafilaxia;
pub mod asma;
pub mod bronquiolite;
pub mod cetoacidose_diabetica;
pub mod convulsao_febril;
pub mod crupe;
pub mod dengue;
pub mod desidratacao;
pub mod estado_de_mal_epileptico;
pub mod faringoamigdalite;
pub mod hipoglicemia;
pub mod itu;
pub mod meningite;
pub mod otite_media_aguda;
pub mod pcr;
pub mod pneumonia;
pub mod queimaduras;
pub mod sepse;
pub mod sim_p;
pub mod tce;

use crate::definition::ProtocolDefinition;

pub fn all_protocols() -> Vec<ProtocolDefinition> {
    vec![
        anafilaxia::definition(),
        asma::definition(),
        bronquiolite::definition(),
        pneumonia::definition(),
        sepse::definition(),
        desidratacao::definition(),
        estado_de_mal_epileptico::definition(),
        cetoacidose_diabetica::definition(),
        sim_p::definition(),
        crupe::definition(),
        tce::definition(),
        dengue::definition(),
        itu::definition(),
        meningite::definition(),
        otite_media_aguda::definition(),
        faringoamigdalite::definition(),
        queimaduras::definition(),
        hipoglicemia::definition(),
        convulsao_febril::definition(),
        pcr::definition(),
    ]
}
