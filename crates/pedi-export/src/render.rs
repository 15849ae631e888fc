use jiff::Timestamp;
use serde::Serialize;
use tera::{Context, Tera};

use pedi_core::models::result::CalculationResult;

use crate::error::ExportError;

const DEFAULT_TEMPLATE_NAME: &str = "resumo.md";

/// Clipboard summary. Uses the subset of Markdown that
/// [`crate::docx::generate_docx`] understands.
pub const DEFAULT_TEMPLATE: &str = r#"# {{ protocol_name }}

**Classificação:** {{ classification.level.label }}{% if score %} (escore {{ score }}){% endif %}
{%- if classification.overridden %}
> Nível definido por sinal de perigo
{%- endif %}
{%- if classification.contributing_criteria %}

## Achados
{%- for item in classification.contributing_criteria %}
- {{ item }}
{%- endfor %}
{%- endif %}
{%- if dose_lines %}

## Doses
{%- for dose in dose_lines %}
- {{ dose.text }}{% if dose.capped %} **(dose máxima)**{% endif %}
{%- if dose.note %}
> {{ dose.note }}
{%- endif %}
{%- endfor %}
{%- endif %}

## Condutas
{%- for item in recommendations %}
- {{ item }}
{%- endfor %}

## Internação
{%- if hospitalization.indicated %}
{%- for reason in hospitalization.reasons %}
- {{ reason }}
{%- endfor %}
{%- else %}
- Não indicada
{%- endif %}
{%- if icu_indication and icu_indication.indicated %}

## UTI
{%- for reason in icu_indication.reasons %}
- {{ reason }}
{%- endfor %}
{%- endif %}
{%- if discharge_criteria %}

## Critérios de alta
{%- for item in discharge_criteria %}
- {{ item }}
{%- endfor %}
{%- endif %}
{%- if generated_at %}

Gerado em {{ generated_at }}. Apoio à decisão; não substitui o julgamento clínico.
{%- endif %}
"#;

/// A dose pre-formatted for templates, so they don't have to know about
/// units or concentrations.
#[derive(Debug, Serialize)]
struct DoseLine<'a> {
    text: String,
    capped: bool,
    note: Option<&'a str>,
}

/// Render `template_content` with `result` as context.
///
/// Every field of the result is available at the top level, plus
/// `dose_lines` (text, capped, note) and `score` as display strings.
pub fn render_result(
    template_name: &str,
    template_content: &str,
    result: &CalculationResult,
) -> Result<String, ExportError> {
    render_with(template_name, template_content, result, None)
}

/// Render the built-in clipboard summary, stamped with `generated_at`.
pub fn render_default(
    result: &CalculationResult,
    generated_at: Timestamp,
) -> Result<String, ExportError> {
    let stamp = generated_at.strftime("%d/%m/%Y %H:%M UTC").to_string();
    render_with(DEFAULT_TEMPLATE_NAME, DEFAULT_TEMPLATE, result, Some(stamp))
}

fn render_with(
    template_name: &str,
    template_content: &str,
    result: &CalculationResult,
    generated_at: Option<String>,
) -> Result<String, ExportError> {
    let mut tera = Tera::default();
    tera.add_raw_template(template_name, template_content)
        .map_err(|e| ExportError::TemplateParse(e.to_string()))?;

    let value = serde_json::to_value(result)?;
    let mut context =
        Context::from_value(value).map_err(|e| ExportError::TemplateRender(e.to_string()))?;

    let dose_lines: Vec<DoseLine<'_>> = result
        .doses
        .iter()
        .map(|dose| DoseLine {
            text: dose.summary(),
            capped: dose.capped,
            note: dose.note.as_deref(),
        })
        .collect();
    context.insert("dose_lines", &dose_lines);
    context.insert(
        "score",
        &result.classification.score.map(|s| s.to_string()),
    );
    context.insert("generated_at", &generated_at);

    let rendered = tera.render(template_name, &context)?;
    tracing::debug!(
        protocol_id = %result.protocol_id,
        template = template_name,
        bytes = rendered.len(),
        "result rendered"
    );
    Ok(rendered)
}
