// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Plain-language summary composition
//!
//! Pure, deterministic rendering of an analysis into the five narrative
//! fields a non-technical reader sees. Cost anomalies are the one place a
//! concrete numeric promise is made (excess cost per day and per month):
//! cost deltas are arithmetic, while performance and stability gains depend
//! on implementation and stay hedged.

use crate::anomaly::{
    Anomaly, AnomalyType, HumanReadableSummary, Recommendation, RootCause, Severity,
};

/// Compose the full summary for an analysis.
pub fn compose(
    anomaly: &Anomaly,
    root_cause: &RootCause,
    recommendations: &[Recommendation],
) -> HumanReadableSummary {
    HumanReadableSummary {
        what_happened: what_happened(anomaly),
        why_it_happened: why_it_happened(root_cause),
        what_is_the_impact: impact(anomaly),
        what_improvements_can_be_made: improvements(recommendations),
        estimated_benefit_if_implemented: benefits(anomaly, recommendations),
    }
}

/// Expected impact if the anomaly is not addressed.
pub fn predict_impact(anomaly: &Anomaly) -> String {
    match anomaly.severity {
        Severity::Critical => "Immediate service disruption likely. User impact imminent.",
        Severity::High => "Significant degradation expected within hours. Action required soon.",
        Severity::Medium => "Gradual degradation over days. Should be addressed proactively.",
        Severity::Low => "Minor impact. Monitor for escalation.",
    }
    .to_string()
}

fn what_happened(anomaly: &Anomaly) -> String {
    let metric_desc = metric_label(&anomaly.metric_name);

    let (direction, comparison) = if anomaly.current_value > anomaly.baseline_value {
        ("increased", "higher than")
    } else {
        ("decreased", "lower than")
    };

    let current_str = format_value(anomaly.current_value, &anomaly.metric_type);
    let baseline_str = format_value(anomaly.baseline_value, &anomaly.metric_type);

    let mut explanation = format!(
        "We detected an unusual spike in your system's {metric_desc}. \
         The {metric_desc} {direction} to {current_str}, which is {deviation:.0}% {comparison} \
         the normal level of {baseline_str}. \
         This change is significant - it's {sigma:.1} times larger than typical variations we see.",
        deviation = anomaly.deviation_percentage.abs(),
        sigma = anomaly.deviation_sigma,
    );

    if let Some(resources) = &anomaly.affected_resources {
        match resources.len() {
            0 => {}
            1 => explanation.push_str(" This issue is affecting 1 resource in your system."),
            n => explanation.push_str(&format!(
                " This issue is affecting {n} resources in your system."
            )),
        }
    }

    explanation
}

fn why_it_happened(root_cause: &RootCause) -> String {
    let mut explanation = root_cause.primary_cause.clone();

    if !root_cause.contributing_factors.is_empty() {
        explanation.push_str("\n\nSeveral factors contributed to this issue:\n");
        for (i, factor) in root_cause.contributing_factors.iter().take(3).enumerate() {
            explanation.push_str(&format!("{}. {factor}\n", i + 1));
        }
    }

    if !root_cause.evidence.is_empty() {
        explanation.push_str("\nWe identified this by observing:\n");
        for item in root_cause.evidence.iter().take(3) {
            explanation.push_str(&format!("\u{2022} {item}\n"));
        }
    }

    if root_cause.migration_likely_cause() {
        explanation.push_str("\n**Migration Event Detected:**\n");
        explanation.push_str(root_cause.migration_impact_summary().unwrap_or_default());
        let factors = root_cause.migration_impact_factors();
        if !factors.is_empty() {
            explanation.push_str("\n\nSpecific changes that may have caused this:\n");
            for factor in factors.iter().take(3) {
                explanation.push_str(&format!("\u{2022} {factor}\n"));
            }
        }
    }

    let confidence_pct = root_cause.confidence * 100.0;
    let confidence_str = if confidence_pct >= 90.0 {
        "very confident"
    } else if confidence_pct >= 75.0 {
        "confident"
    } else if confidence_pct >= 60.0 {
        "reasonably confident"
    } else {
        "moderately confident"
    };
    explanation.push_str(&format!(
        "\nWe are {confidence_str} ({confidence_pct:.0}%) in this assessment based on the available data."
    ));

    explanation.trim().to_string()
}

fn impact(anomaly: &Anomaly) -> String {
    let current = format_currency(anomaly.current_value);
    let baseline = format_currency(anomaly.baseline_value);
    let deviation = anomaly.deviation_percentage.abs();

    let mut impact = match (anomaly.anomaly_type, anomaly.severity) {
        (AnomalyType::Stability, Severity::Critical) =>
            "Your system is experiencing critical stability issues that could lead to complete service \
             outages. Users may be unable to access your services, and data integrity could be at risk. \
             This requires immediate attention to prevent business disruption.".to_string(),
        (AnomalyType::Stability, Severity::High) =>
            "Your system's reliability is significantly degraded. Users are likely experiencing errors \
             and service interruptions. If not addressed quickly, this could escalate to a complete \
             outage and damage user trust.".to_string(),
        (AnomalyType::Stability, Severity::Medium) =>
            "Your system is showing signs of instability. Some users may experience occasional errors \
             or degraded service. While not critical yet, this should be addressed soon to prevent \
             escalation.".to_string(),
        (AnomalyType::Stability, Severity::Low) =>
            "Minor stability issues detected. Most users won't notice any problems, but monitoring is \
             recommended to ensure it doesn't worsen.".to_string(),

        (AnomalyType::Performance, Severity::Critical) =>
            "Your system is running extremely slowly, severely impacting user experience. Users are \
             likely abandoning tasks due to long wait times. This is causing significant business \
             impact and potential revenue loss.".to_string(),
        (AnomalyType::Performance, Severity::High) =>
            "Performance has degraded noticeably. Users are experiencing slow response times that are \
             frustrating and may lead to reduced engagement or lost business opportunities.".to_string(),
        (AnomalyType::Performance, Severity::Medium) =>
            "System performance is slower than normal. While still functional, users may notice delays \
             that could affect their satisfaction and productivity.".to_string(),
        (AnomalyType::Performance, Severity::Low) =>
            "Minor performance degradation detected. Most users won't notice significant differences, \
             but efficiency could be improved.".to_string(),

        (AnomalyType::Cost, Severity::Critical) => format!(
            "Your computing costs have spiked dramatically to ${current}, which is {deviation:.0}% \
             higher than your normal spending of ${baseline}. This represents significant unexpected \
             expenses that could impact your budget."),
        (AnomalyType::Cost, Severity::High) => format!(
            "Computing costs have increased substantially to ${current}, exceeding your normal budget \
             by {deviation:.0}%. This is causing unnecessary financial waste that should be addressed."),
        (AnomalyType::Cost, Severity::Medium) => format!(
            "Your costs have risen to ${current}, which is {deviation:.0}% above normal. While not \
             critical, this represents inefficient resource usage that could be optimized."),
        (AnomalyType::Cost, Severity::Low) =>
            "Costs are slightly elevated but within acceptable ranges. However, optimization \
             opportunities exist to improve efficiency.".to_string(),

        (AnomalyType::Resource, Severity::Critical) =>
            "System resources are critically overloaded. This could lead to crashes, data loss, or \
             complete service failure. Immediate action is required to prevent system collapse.".to_string(),
        (AnomalyType::Resource, Severity::High) =>
            "Resources are heavily strained. The system is at risk of becoming unstable or \
             unresponsive. Performance degradation is likely affecting users.".to_string(),
        (AnomalyType::Resource, Severity::Medium) =>
            "Resource usage is higher than normal. While the system is still functioning, there's \
             reduced capacity to handle additional load or unexpected spikes.".to_string(),
        (AnomalyType::Resource, Severity::Low) =>
            "Resource usage is slightly elevated. The system is stable but could benefit from \
             optimization to improve efficiency.".to_string(),
    };

    if anomaly.severity.is_urgent() {
        impact.push_str(
            "\n\nTime is critical: The longer this issue persists, the greater the potential for \
             business disruption, user dissatisfaction, and financial impact.",
        );
    }

    impact
}

fn improvements(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return "We're still analyzing the best course of action. Please check back shortly for \
                specific recommendations."
            .to_string();
    }

    let mut explanation = String::from("Based on our analysis, here are the actions we recommend:\n\n");

    for rec in recommendations.iter().take(4) {
        explanation.push_str(&format!(
            "{} **{} PRIORITY**: {}\n",
            rec.priority.marker(),
            rec.priority.to_string().to_uppercase(),
            rec.action
        ));
        explanation.push_str(&format!("   Why: {}\n", rec.rationale));

        if !rec.implementation_steps.is_empty() {
            explanation.push_str("   How to do it:\n");
            for step in rec.implementation_steps.iter().take(3) {
                explanation.push_str(&format!("   \u{2022} {step}\n"));
            }
        }

        if !rec.estimated_effort.is_empty() {
            explanation.push_str(&format!("   Time needed: {}\n", rec.estimated_effort));
        }

        explanation.push('\n');
    }

    explanation.trim().to_string()
}

fn benefits(anomaly: &Anomaly, recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return "Benefits will be determined once specific recommendations are available.".to_string();
    }

    let mut benefits: Vec<String> = Vec::new();

    match anomaly.anomaly_type {
        AnomalyType::Stability => {
            benefits.push(
                "**Improved Reliability**: By implementing these recommendations, you can expect to \
                 significantly reduce errors and restore system stability to normal levels. This means \
                 fewer service interruptions and improved user experience."
                    .to_string(),
            );
            benefits.push(
                "**Reduced Downtime**: Proactive fixes will help prevent potential outages, reducing \
                 downtime and the associated costs of lost productivity and revenue."
                    .to_string(),
            );
        }
        AnomalyType::Performance => {
            // Only the baseline is certain; the improvement itself stays hedged.
            benefits.push(format!(
                "**Faster Response Times**: These optimizations will help bring response times back \
                 toward normal levels (baseline: {:.0}ms). The exact improvement will depend on \
                 implementation and system conditions.",
                anomaly.baseline_value
            ));
            benefits.push(
                "**Better User Experience**: Faster systems lead to higher user satisfaction and \
                 increased engagement. Performance improvements typically result in better business \
                 outcomes."
                    .to_string(),
            );
        }
        AnomalyType::Cost => {
            // Cost deltas are arithmetic, so this promise is concrete.
            let excess_cost = anomaly.current_value - anomaly.baseline_value;
            let monthly_savings = excess_cost * 30.0;
            benefits.push(format!(
                "**Quantifiable Cost Savings**: By right-sizing resources and eliminating waste, you \
                 can save **${} per day** (approximately **${} per month**). This is based on \
                 returning to your baseline cost of ${}.",
                format_currency(excess_cost),
                format_currency(monthly_savings),
                format_currency(anomaly.baseline_value)
            ));

            let has_performance_note = recommendations.iter().any(|rec| {
                rec.cost_impact
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase().contains("performance"))
            });
            if has_performance_note {
                benefits.push(
                    "**No Performance Trade-off**: Our analysis shows that these cost optimizations \
                     can be implemented without negatively impacting system performance. You'll save \
                     money while maintaining the same level of service."
                        .to_string(),
                );
            } else {
                benefits.push(
                    "**Improved Efficiency**: These changes will optimize resource usage, reducing \
                     waste while maintaining or improving system performance."
                        .to_string(),
                );
            }
        }
        AnomalyType::Resource => {
            benefits.push(
                "**Better Resource Utilization**: Optimizing resource usage will free up capacity for \
                 growth, improve system stability, and reduce the risk of resource-related failures."
                    .to_string(),
            );
            benefits.push(
                "**Cost Efficiency**: Better resource management will lead to cost savings while \
                 improving overall system performance and reliability. Specific savings will depend \
                 on implementation."
                    .to_string(),
            );
        }
    }

    if anomaly.severity.is_urgent() {
        benefits.push(
            "**Quick Wins**: Many of these improvements can be implemented quickly (within hours to \
             days) and will show immediate positive results."
                .to_string(),
        );
    }

    benefits.push(
        "**Long-term Stability**: Addressing this issue now prevents it from recurring and \
         establishes better practices for system health monitoring and maintenance."
            .to_string(),
    );

    benefits.join("\n\n")
}

/// Human label for a metric name, underscores-to-spaces when unknown.
fn metric_label(metric_name: &str) -> String {
    match metric_name.to_lowercase().as_str() {
        "error_rate" => "error rate".to_string(),
        "task_execution_time" => "task completion time".to_string(),
        "cpu_utilization" => "CPU usage".to_string(),
        "memory_usage" => "memory usage".to_string(),
        "request_latency" => "response time".to_string(),
        "compute_cost" => "computing costs".to_string(),
        "throughput" => "processing speed".to_string(),
        _ => metric_name.replace('_', " "),
    }
}

/// Format a value according to the unit hints in the metric type tag.
fn format_value(value: f64, metric_type: &str) -> String {
    let tag = metric_type.to_lowercase();
    if tag.contains("rate") || metric_type.contains('%') {
        format!("{value:.1}%")
    } else if tag.contains("cost") || tag.contains("usd") {
        format!("${}", format_currency(value))
    } else if tag.contains("time") || tag.contains("ms") {
        format!("{value:.0}ms")
    } else {
        format!("{value:.1}")
    }
}

/// Two-decimal formatting with thousands separators, e.g. `12,345.67`.
fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let formatted = format!("{:.2}", value.abs());
    let (integer, decimals) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::new();
    for (i, digit) in integer.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let grouped: String = grouped.chars().rev().collect();

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{decimals}")
}
