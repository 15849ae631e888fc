//! Community-acquired pneumonia, classified by the WHO danger signs.

use pedi_core::models::params::AGE_MONTHS;
use pedi_core::units::{DoseUnit, Rounding};

use super::common::{self, SPO2, TEMPERATURE};
use crate::definition::{
    ClassificationRules, ConditionalBlock, FieldSpec, LevelBlock, LevelRule, MedicationRule,
    Override, ProtocolDefinition, Reason, RecommendationRules, Strategy, levels, texts,
};
use crate::formula::DoseFormula;
use crate::predicate::{above, all, any, below, is, level_at_least, level_is, not};

const CHEST_INDRAWING: &str = "chestIndrawing";
const GRUNTING: &str = "grunting";
const CANNOT_DRINK: &str = "cannotDrink";
const CONVULSIONS: &str = "convulsions";
const LETHARGY: &str = "lethargy";
const CYANOSIS: &str = "cyanosis";
const PLEURAL_EFFUSION: &str = "pleuralEffusion";
const VOMITING: &str = "persistentVomiting";
const FAILED_OUTPATIENT: &str = "failedOutpatientTreatment";
const COMORBIDITY: &str = "comorbidity";
const PENICILLIN_ALLERGY: &str = "penicillinAllergy";

pub const AMOXICILLIN: &str = "Amoxicilina";

pub fn definition() -> ProtocolDefinition {
    ProtocolDefinition {
        id: "pneumonia".to_string(),
        name: "Pneumonia adquirida na comunidade".to_string(),
        description: "Classificação da pneumonia pelos sinais de gravidade e escolha do \
                      antibiótico inicial."
            .to_string(),
        fields: common::patient_fields(vec![
            common::respiratory_rate(),
            common::oxygen_saturation(),
            common::temperature(),
            FieldSpec::flag(CHEST_INDRAWING, "Tiragem subcostal"),
            FieldSpec::flag(GRUNTING, "Gemência"),
            FieldSpec::flag(CANNOT_DRINK, "Incapaz de beber ou mamar"),
            FieldSpec::flag(CONVULSIONS, "Convulsões"),
            FieldSpec::flag(LETHARGY, "Letargia ou inconsciência"),
            FieldSpec::flag(CYANOSIS, "Cianose central"),
            FieldSpec::flag(PLEURAL_EFFUSION, "Derrame pleural"),
            FieldSpec::flag(VOMITING, "Vômitos incoercíveis"),
            FieldSpec::flag(FAILED_OUTPATIENT, "Falha de tratamento ambulatorial"),
            FieldSpec::flag(COMORBIDITY, "Comorbidade significativa"),
            FieldSpec::flag(PENICILLIN_ALLERGY, "Alergia a penicilina"),
        ]),
        classification: ClassificationRules {
            levels: levels(&[
                ("pneumonia", "Pneumonia sem sinais de gravidade"),
                ("grave", "Pneumonia grave"),
                ("muito_grave", "Pneumonia muito grave"),
            ]),
            overrides: vec![
                Override::new("Incapaz de beber ou mamar", is(CANNOT_DRINK)),
                Override::new("Convulsões", is(CONVULSIONS)),
                Override::new("Letargia ou inconsciência", is(LETHARGY)),
                Override::new("Cianose central", is(CYANOSIS)),
                Override::new("SpO₂ < 90%", below(SPO2, 90.0)),
            ],
            strategy: Strategy::Direct {
                rules: vec![
                    LevelRule::new(
                        "Tiragem, gemência, derrame, hipoxemia ou idade < 2 meses",
                        any(vec![
                            is(CHEST_INDRAWING),
                            is(GRUNTING),
                            is(PLEURAL_EFFUSION),
                            below(SPO2, 92.0),
                            below(AGE_MONTHS, 2.0),
                        ]),
                        "grave",
                    ),
                    LevelRule::otherwise("Sem sinais de gravidade", "pneumonia"),
                ],
            },
        },
        medications: vec![
            MedicationRule::new(
                AMOXICILLIN,
                DoseFormula::per_kg(50.0).capped(1500.0).divided(3),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("a cada 8 horas por 5 a 7 dias")
            .concentration(250.0, 5.0)
            .rounding(Rounding::one_decimal())
            .volume_rounding(Rounding::one_decimal())
            .when(all(vec![level_is("pneumonia"), not(is(PENICILLIN_ALLERGY))])),
            MedicationRule::new(
                "Azitromicina",
                DoseFormula::per_kg(10.0).capped(500.0),
                DoseUnit::Mg,
                "VO",
            )
            .frequency("uma vez ao dia por 5 dias")
            .concentration(200.0, 5.0)
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![level_is("pneumonia"), is(PENICILLIN_ALLERGY)])),
            MedicationRule::new(
                "Ampicilina",
                DoseFormula::per_kg(200.0).capped(12000.0).divided(4),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("a cada 6 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("grave")),
            MedicationRule::new(
                "Ceftriaxona",
                DoseFormula::per_kg(75.0).capped(2000.0),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("uma vez ao dia")
            .rounding(Rounding::Decimals { places: 0 })
            .when(level_is("muito_grave")),
            MedicationRule::new(
                "Oxacilina",
                DoseFormula::per_kg(200.0).capped(12000.0).divided(4),
                DoseUnit::Mg,
                "IV",
            )
            .frequency("a cada 6 horas")
            .rounding(Rounding::Decimals { places: 0 })
            .when(all(vec![level_is("muito_grave"), is(PLEURAL_EFFUSION)]))
            .note("Associar se suspeita de Staphylococcus aureus (derrame, pneumatocele)"),
            common::paracetamol().when(above(TEMPERATURE, 37.8)),
        ],
        recommendations: RecommendationRules {
            general: texts(&[
                "Radiografia de tórax não é necessária no tratamento ambulatorial",
                "Oxigênio para manter SpO₂ ≥ 92%",
            ]),
            by_level: vec![
                LevelBlock::new(
                    "pneumonia",
                    &[
                        "Tratamento ambulatorial com amoxicilina oral",
                        "Reavaliar em 48 a 72 horas",
                    ],
                ),
                LevelBlock::new(
                    "grave",
                    &[
                        "Internação e antibiótico parenteral",
                        "Radiografia de tórax e hemograma",
                    ],
                ),
                LevelBlock::new(
                    "muito_grave",
                    &[
                        "Estabilização imediata: via aérea, oxigênio e acesso venoso",
                        "Hemocultura antes do antibiótico, sem atrasá-lo",
                        "Avaliar suporte ventilatório",
                    ],
                ),
            ],
            conditional: vec![
                ConditionalBlock::new(
                    is(PLEURAL_EFFUSION),
                    &["Derrame pleural: ultrassonografia e avaliar drenagem torácica"],
                ),
                ConditionalBlock::new(
                    is(FAILED_OUTPATIENT),
                    &["Falha terapêutica: investigar complicações e rever cobertura antibiótica"],
                ),
            ],
        },
        hospitalization: vec![
            Reason::new("Pneumonia grave ou muito grave", level_at_least("grave")),
            Reason::new("Idade menor que 2 meses", below(AGE_MONTHS, 2.0)),
            Reason::new("Falha de tratamento ambulatorial", is(FAILED_OUTPATIENT)),
            Reason::new("Comorbidade significativa", is(COMORBIDITY)),
            Reason::new("Vômitos incoercíveis", is(VOMITING)),
        ],
        icu: Some(vec![
            Reason::new("Pneumonia muito grave", level_is("muito_grave")),
            Reason::new("Cianose central", is(CYANOSIS)),
        ]),
        discharge_criteria: texts(&[
            "Aceitação da via oral",
            "SpO₂ ≥ 92% em ar ambiente",
            "Cuidadores capazes de administrar o antibiótico",
            "Retorno garantido em 48 a 72 horas",
        ]),
    }
}
