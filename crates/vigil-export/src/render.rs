use tera::{Context, Tera};

use crate::error::ExportError;
use crate::report::PatientSummary;

const SUMMARY_TEMPLATE_NAME: &str = "patient_summary.md";

pub const DEFAULT_SUMMARY_TEMPLATE: &str = r#"# Patient Summary: {{ patient.first_name }} {{ patient.last_name }}

- **MRN:** {{ patient.mrn }}
- **Date of birth:** {{ patient.date_of_birth }}
- **Gender:** {{ patient.gender }}
- **Status:** {% if patient.is_active %}active{% else %}inactive{% endif %}
{%- if patient.comorbidities %}
- **Comorbidities:** {{ patient.comorbidities | join(sep=", ") }}
{%- endif %}
{%- if patient.allergies %}
- **Allergies:** {{ patient.allergies | join(sep=", ") }}
{%- endif %}

Generated {{ generated_at }}

## Latest vitals
{% if latest_vitals %}
Measured {{ latest_vitals.measurement_time }}

| Measure | Value |
|---|---|
{%- if latest_vitals.heart_rate is number %}
| Heart rate | {{ latest_vitals.heart_rate }} bpm |
{%- endif %}
{%- if latest_vitals.systolic_bp is number %}{% if latest_vitals.diastolic_bp is number %}
| Blood pressure | {{ latest_vitals.systolic_bp }}/{{ latest_vitals.diastolic_bp }} mmHg |
{%- endif %}{% endif %}
{%- if latest_vitals.respiratory_rate is number %}
| Respiratory rate | {{ latest_vitals.respiratory_rate }} /min |
{%- endif %}
{%- if latest_vitals.temperature is number %}
| Temperature | {{ latest_vitals.temperature }} °C |
{%- endif %}
{%- if latest_vitals.oxygen_saturation is number %}
| SpO2 | {{ latest_vitals.oxygen_saturation }} % |
{%- endif %}
{%- if latest_vitals.blood_glucose is number %}
| Blood glucose | {{ latest_vitals.blood_glucose }} mg/dL |
{%- endif %}
{%- if latest_vitals.weight is number %}
| Weight | {{ latest_vitals.weight }} kg |
{%- endif %}
{% else %}
No vitals recorded.
{% endif %}
## Recent labs ({{ out_of_range_labs }} out of range)
{% if recent_labs %}
| Test | Value | Reference | Date | Flag |
|---|---|---|---|---|
{%- for lab in recent_labs %}
| {{ lab.test_name }} | {% if lab.test_value is number %}{{ lab.test_value }}{% if lab.unit %} {{ lab.unit }}{% endif %}{% else %}-{% endif %} | {% if lab.reference_low is number %}{{ lab.reference_low }}{% endif %}-{% if lab.reference_high is number %}{{ lab.reference_high }}{% endif %} | {{ lab.test_date }} | {% if lab.out_of_range %}OUT OF RANGE{% endif %} |
{%- endfor %}
{% else %}
No lab results.
{% endif %}
## Risk
{% if latest_assessment %}
Score **{{ latest_assessment.risk_score }}**{% if latest_assessment.risk_category %} ({{ latest_assessment.risk_category }}){% endif %}{% if latest_assessment.assessment_type %}, {{ latest_assessment.assessment_type }}{% endif %}, assessed {{ latest_assessment.assessment_date }}.
{% else %}
No risk assessment on file.
{% endif %}
## Active alerts
{% for alert in active_alerts %}
- [{{ alert.alert_type }}] {{ alert.title }} ({{ alert.status }}){% if alert.message %}: {{ alert.message }}{% endif %}
{%- else %}
None.
{%- endfor %}{% if omitted_alerts > 0 %}
- ...and {{ omitted_alerts }} more
{%- endif %}

## Recent interventions
{% for item in recent_interventions %}
- {{ item.intervention_date }}: {{ item.intervention_type }}{% if item.outcome %} ({{ item.outcome }}){% endif %}
{%- else %}
None.
{%- endfor %}
"#;

/// Render a summary as Markdown.
///
/// `template` replaces the built-in layout; the summary's fields are the
/// template context.
pub fn render_summary(
    summary: &PatientSummary,
    template: Option<&str>,
) -> Result<String, ExportError> {
    let mut tera = Tera::default();
    tera.add_raw_template(SUMMARY_TEMPLATE_NAME, template.unwrap_or(DEFAULT_SUMMARY_TEMPLATE))
        .map_err(|e| ExportError::TemplateParse(e.to_string()))?;

    let value = serde_json::to_value(summary)?;
    let context =
        Context::from_value(value).map_err(|e| ExportError::TemplateRender(e.to_string()))?;

    let rendered = tera.render(SUMMARY_TEMPLATE_NAME, &context)?;
    tracing::debug!(
        patient_id = %summary.patient.id,
        bytes = rendered.len(),
        "rendered patient summary"
    );
    Ok(rendered)
}
