//! Configuration validation.
//!
//! Rejects out-of-range values and combinations that could never work, with a
//! message naming the offending key.

use anyhow::Result;

use super::Config;
use crate::constants::*;
use crate::schedule::parse_clock_time;
use crate::time_source::LocalZone;

pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(interval) = config.tick_interval_ms
        && !(MINIMUM_TICK_INTERVAL_MS..=MAXIMUM_TICK_INTERVAL_MS).contains(&interval)
    {
        anyhow::bail!(
            "tick_interval_ms ({}) must be between {} and {} milliseconds",
            interval,
            MINIMUM_TICK_INTERVAL_MS,
            MAXIMUM_TICK_INTERVAL_MS
        );
    }

    if let Some(timeout) = config.motion_timeout
        && !(MINIMUM_MOTION_TIMEOUT..=MAXIMUM_MOTION_TIMEOUT).contains(&timeout)
    {
        anyhow::bail!(
            "motion_timeout ({}) must be between {} and {} seconds",
            timeout,
            MINIMUM_MOTION_TIMEOUT,
            MAXIMUM_MOTION_TIMEOUT
        );
    }

    if let Some(inputs) = &config.motion_inputs
        && inputs.iter().any(|path| path.trim().is_empty())
    {
        anyhow::bail!("motion_inputs must not contain empty paths");
    }

    if let Some(step) = config.fade_step
        && step < MINIMUM_FADE_STEP
    {
        anyhow::bail!("fade_step must be at least {}", MINIMUM_FADE_STEP);
    }

    if let Some(interval) = config.fade_step_interval_ms
        && !(MINIMUM_FADE_STEP_INTERVAL_MS..=MAXIMUM_FADE_STEP_INTERVAL_MS).contains(&interval)
    {
        anyhow::bail!(
            "fade_step_interval_ms ({}) must be between {} and {} milliseconds",
            interval,
            MINIMUM_FADE_STEP_INTERVAL_MS,
            MAXIMUM_FADE_STEP_INTERVAL_MS
        );
    }

    LocalZone::from_config(config.timezone.as_deref())?;

    validate_coordinates(config)?;

    for (key, url) in [
        ("schedule_url", &config.schedule_url),
        ("twilight_url", &config.twilight_url),
        ("event_url", &config.event_url),
    ] {
        if let Some(url) = url {
            validate_url(key, url)?;
        }
    }

    if let Some(description) = &config.schedule {
        if config.schedule_url.is_some() {
            log_warning!("Both schedule_url and [schedule] are set; the inline schedule is ignored");
        }
        for (key, anchored, time) in [
            (
                "start_time",
                description.start_anchor().is_some(),
                &description.start_time,
            ),
            (
                "end_time",
                description.end_anchor().is_some(),
                &description.end_time,
            ),
        ] {
            if anchored {
                continue;
            }
            match time {
                Some(text) if parse_clock_time(text).is_some() => {}
                Some(text) => anyhow::bail!("[schedule] {} '{}' is not HH:MM or HH:MM:SS", key, text),
                None => anyhow::bail!("[schedule] {} is required for a fixed boundary", key),
            }
        }
        if description.needs_solar()
            && config.twilight_url.is_none()
            && (config.latitude.is_none() || config.longitude.is_none())
        {
            anyhow::bail!(
                "[schedule] uses civil_dawn/civil_dusk but neither twilight_url nor latitude/longitude is set"
            );
        }
    }

    let retry = config
        .schedule_retry_interval
        .unwrap_or(DEFAULT_SCHEDULE_RETRY_INTERVAL);
    if !(MINIMUM_SCHEDULE_RETRY_INTERVAL..=MAXIMUM_SCHEDULE_RETRY_INTERVAL).contains(&retry) {
        anyhow::bail!(
            "schedule_retry_interval ({}) must be between {} and {} seconds",
            retry,
            MINIMUM_SCHEDULE_RETRY_INTERVAL,
            MAXIMUM_SCHEDULE_RETRY_INTERVAL
        );
    }

    if let Some(interval) = config.schedule_eval_interval
        && !(MINIMUM_SCHEDULE_EVAL_INTERVAL..=MAXIMUM_SCHEDULE_EVAL_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "schedule_eval_interval ({}) must be between {} and {} seconds",
            interval,
            MINIMUM_SCHEDULE_EVAL_INTERVAL,
            MAXIMUM_SCHEDULE_EVAL_INTERVAL
        );
    }

    if let Some(hour) = config.schedule_refresh_hour
        && hour > 23
    {
        anyhow::bail!("schedule_refresh_hour ({}) must be between 0 and 23", hour);
    }

    let timeout = config.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT);
    if !(MINIMUM_HTTP_TIMEOUT..=MAXIMUM_HTTP_TIMEOUT).contains(&timeout) {
        anyhow::bail!(
            "http_timeout ({}) must be between {} and {} seconds",
            timeout,
            MINIMUM_HTTP_TIMEOUT,
            MAXIMUM_HTTP_TIMEOUT
        );
    }
    if timeout >= retry {
        anyhow::bail!(
            "http_timeout ({}s) must be shorter than schedule_retry_interval ({}s)",
            timeout,
            retry
        );
    }

    if config.event_token.is_some() && config.event_url.is_none() {
        log_warning!("event_token is set without event_url; events will not be delivered");
    }

    if let Some(capacity) = config.event_queue_capacity
        && !(MINIMUM_EVENT_QUEUE_CAPACITY..=MAXIMUM_EVENT_QUEUE_CAPACITY).contains(&capacity)
    {
        anyhow::bail!(
            "event_queue_capacity ({}) must be between {} and {}",
            capacity,
            MINIMUM_EVENT_QUEUE_CAPACITY,
            MAXIMUM_EVENT_QUEUE_CAPACITY
        );
    }

    if let Some(interval) = config.event_min_interval_ms
        && !(MINIMUM_EVENT_MIN_INTERVAL_MS..=MAXIMUM_EVENT_MIN_INTERVAL_MS).contains(&interval)
    {
        anyhow::bail!(
            "event_min_interval_ms ({}) must be between {} and {} milliseconds",
            interval,
            MINIMUM_EVENT_MIN_INTERVAL_MS,
            MAXIMUM_EVENT_MIN_INTERVAL_MS
        );
    }

    if let Some(interval) = config.status_interval
        && !(MINIMUM_STATUS_INTERVAL..=MAXIMUM_STATUS_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "status_interval ({}) must be between {} and {} seconds",
            interval,
            MINIMUM_STATUS_INTERVAL,
            MAXIMUM_STATUS_INTERVAL
        );
    }

    validate_status_feed(config)?;

    Ok(())
}

fn validate_status_feed(config: &Config) -> Result<()> {
    if let Some(host) = &config.mqtt_host
        && host.trim().is_empty()
    {
        anyhow::bail!("mqtt_host must not be empty");
    }

    if config.mqtt_port == Some(0) {
        anyhow::bail!("mqtt_port must be between 1 and 65535");
    }

    if let Some(topic) = &config.mqtt_topic
        && (topic.is_empty() || topic.contains(['+', '#']))
    {
        anyhow::bail!(
            "mqtt_topic '{}' must be a non-empty topic without wildcards",
            topic
        );
    }

    if config.mqtt_password.is_some() && config.mqtt_username.is_none() {
        anyhow::bail!("mqtt_password requires mqtt_username");
    }

    if config.mqtt_host.is_none() && (config.mqtt_username.is_some() || config.mqtt_tls == Some(true)) {
        log_warning!("MQTT settings are present without mqtt_host; the status feed is off");
    }

    if let Some(heartbeat) = config.status_heartbeat
        && !(MINIMUM_STATUS_HEARTBEAT..=MAXIMUM_STATUS_HEARTBEAT).contains(&heartbeat)
    {
        anyhow::bail!(
            "status_heartbeat ({}) must be between {} and {} seconds",
            heartbeat,
            MINIMUM_STATUS_HEARTBEAT,
            MAXIMUM_STATUS_HEARTBEAT
        );
    }

    Ok(())
}

fn validate_coordinates(config: &Config) -> Result<()> {
    match (config.latitude, config.longitude) {
        (Some(_), None) | (None, Some(_)) => {
            anyhow::bail!("latitude and longitude must be set together")
        }
        _ => {}
    }

    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    Ok(())
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("{} must be an http:// or https:// URL (got '{}')", key, url);
    }
    Ok(())
}
