use serde_json::json;

use pedi_core::models::params::FieldValue;
use pedi_core::units::DoseUnit;
use pedi_protocols::Registry;
use pedi_protocols::definition::{FieldSpec, LevelRule, MedicationRule, Strategy, Threshold};
use pedi_protocols::error::{ConfigurationError, ProtocolError};
use pedi_protocols::formula::DoseFormula;
use pedi_protocols::predicate::{always, is, level_is, unassessed};
use pedi_protocols::protocols::{
    self, asma, crupe, hipoglicemia, pneumonia, queimaduras, sim_p,
};

#[test]
fn builtin_catalog_loads() {
    let registry = Registry::builtin().unwrap();
    assert_eq!(registry.len(), 20);
    assert_eq!(registry.protocols()[0].id, "anafilaxia");
    assert_eq!(registry.protocols()[19].id, "pcr");
    for protocol in registry.protocols() {
        assert!(registry.get(&protocol.id).is_some());
        protocol.check().unwrap();
    }
}

#[test]
fn catalog_survives_a_json_round_trip() {
    let registry = Registry::builtin().unwrap();
    let json = registry.to_json().unwrap();
    let reloaded = Registry::from_json(&json).unwrap();
    let ids = |r: &Registry| r.protocols().iter().map(|p| p.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&reloaded), ids(&registry));

    let input = json!({
        "weight": 25, "age": 8, "oxygenSaturation": 92, "wheezing": "expiratoria"
    });
    assert_eq!(
        registry.calculate("asma", &input).unwrap(),
        reloaded.calculate("asma", &input).unwrap()
    );
}

#[test]
fn malformed_catalog_json_is_a_parse_error() {
    let err = Registry::from_json("[{\"id\": \"asma\"}]").unwrap_err();
    assert!(matches!(err, ProtocolError::Catalog(_)));
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = Registry::new(vec![asma::definition(), asma::definition()]).unwrap_err();
    assert_eq!(err, ConfigurationError::DuplicateProtocol("asma".to_string()));
}

#[test]
fn missing_level_block_is_rejected() {
    let mut def = crupe::definition();
    def.recommendations.by_level.pop();
    assert!(matches!(
        def.check(),
        Err(ConfigurationError::MissingLevelBlock { .. })
    ));
}

#[test]
fn direct_rules_need_a_catch_all() {
    let mut def = hipoglicemia::definition();
    let Strategy::Direct { rules } = &mut def.classification.strategy else {
        panic!("hipoglicemia classifies with direct rules");
    };
    rules.pop();
    assert!(matches!(
        def.check(),
        Err(ConfigurationError::InvalidClassification { .. })
    ));
}

#[test]
fn escalations_cannot_downgrade_a_met_classification() {
    for target in ["nao_preenche", "sim_p"] {
        let mut def = sim_p::definition();
        let Strategy::CriteriaSets { escalations, .. } = &mut def.classification.strategy else {
            panic!("sim_p classifies with criterion sets");
        };
        escalations.push(LevelRule::new("Rebaixamento", always(), target));
        assert!(
            matches!(
                def.check(),
                Err(ConfigurationError::InvalidClassification { .. })
            ),
            "{target}"
        );
    }
}

#[test]
fn thresholds_must_cover_the_minimum_score() {
    let mut def = asma::definition();
    let Strategy::Scored { thresholds, .. } = &mut def.classification.strategy else {
        panic!("asma classifies with a score");
    };
    thresholds.retain(|t| t.min_score > 0.0);
    thresholds.push(Threshold::new(1.0, "leve"));
    assert!(matches!(
        def.check(),
        Err(ConfigurationError::UnreachableThresholds { .. })
    ));
}

#[test]
fn classification_cannot_read_its_own_level() {
    let mut def = pneumonia::definition();
    let Strategy::Direct { rules } = &mut def.classification.strategy else {
        panic!("pneumonia classifies with direct rules");
    };
    rules.insert(0, LevelRule::new("circular", level_is("grave"), "muito_grave"));
    assert!(matches!(
        def.check(),
        Err(ConfigurationError::LevelPredicateInClassification { .. })
    ));
}

#[test]
fn concentration_requires_a_mass_unit() {
    let mut def = pneumonia::definition();
    def.medications.push(
        MedicationRule::new("Soro", DoseFormula::per_kg(10.0), DoseUnit::Ml, "IV")
            .concentration(9.0, 1.0),
    );
    assert!(matches!(
        def.check(),
        Err(ConfigurationError::InvalidMedication { .. })
    ));
}

#[test]
fn formula_fields_must_always_be_present() {
    let mut def = queimaduras::definition();
    def.fields.push(FieldSpec::number("extraSurface", "Superfície extra").unassessed());
    def.medications.push(
        MedicationRule::new(
            "Extra",
            DoseFormula::per_kg(1.0).per_field("extraSurface"),
            DoseUnit::Ml,
            "IV",
        )
        .when(always()),
    );
    assert!(matches!(
        def.check(),
        Err(ConfigurationError::InvalidMedication { .. })
    ));
}

#[test]
fn unassessed_check_needs_an_unassessed_field() {
    let mut def = pneumonia::definition();
    def.medications[0] = def.medications[0].clone().when(unassessed("grunting"));
    assert!(matches!(
        def.check(),
        Err(ConfigurationError::FieldKindMismatch { .. })
    ));
}

#[test]
fn predicates_must_name_declared_fields() {
    let mut def = pneumonia::definition();
    def.medications[0] = def.medications[0].clone().when(is("naoExiste"));
    assert!(matches!(
        def.check(),
        Err(ConfigurationError::UnknownField { .. })
    ));
}

#[test]
fn defaults_must_fit_the_field() {
    let mut def = pneumonia::definition();
    def.fields.push(
        FieldSpec::integer("days", "Dias de febre")
            .between(0.0, 30.0)
            .defaults_to(FieldValue::Number(45.0)),
    );
    assert!(matches!(
        def.check(),
        Err(ConfigurationError::InvalidField { .. })
    ));
}

#[test]
fn every_builtin_definition_is_self_consistent() {
    for def in protocols::all_protocols() {
        if let Err(err) = def.check() {
            panic!("{}: {err}", def.id);
        }
    }
}
