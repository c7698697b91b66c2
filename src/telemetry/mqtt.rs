//! MQTT link for the status feed, on `rumqttc`'s synchronous client.
//!
//! The connection's event loop runs on its own thread, reconnecting every few
//! seconds while the broker is unreachable, and reports connects and drops
//! over a channel. Publishing only queues the message for that thread.

use anyhow::{Context, Result};
use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use super::status_feed::{LinkState, StatusLink};
use crate::constants::*;

#[derive(Debug, Clone, PartialEq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic: String,
}

pub struct MqttStatusLink {
    client: Client,
    topic: String,
    link_events: Receiver<bool>,
    connected: bool,
}

impl MqttStatusLink {
    /// Start the connection thread. Returns immediately; the broker does not
    /// have to be reachable yet.
    pub fn connect(settings: &MqttSettings, debug_enabled: bool) -> Result<Self> {
        let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
        options.set_keep_alive(Duration::from_secs(MQTT_KEEP_ALIVE_SECS));
        if let Some(username) = &settings.username {
            options.set_credentials(username, settings.password.as_deref().unwrap_or_default());
        }
        if settings.tls {
            options.set_transport(rumqttc::Transport::tls_with_default_config());
        }

        let (client, mut connection) = Client::new(options, MQTT_REQUEST_CAPACITY);
        let (events, link_events) = mpsc::channel();
        let broker = format!("{}:{}", settings.host, settings.port);

        thread::Builder::new()
            .name("raillamp-mqtt".to_string())
            .spawn(move || {
                let mut connected = false;
                let mut warned = false;

                // Ends once the client side is dropped.
                for notification in connection.iter() {
                    match notification {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            log_info!("Connected to MQTT broker {}", broker);
                            connected = true;
                            warned = false;
                            if events.send(true).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            if connected {
                                connected = false;
                                if events.send(false).is_err() {
                                    break;
                                }
                            }
                            if !warned {
                                log_warning!("MQTT broker {} unavailable: {}", broker, e);
                                warned = true;
                            } else if debug_enabled {
                                log_debug!("MQTT reconnect failed: {}", e);
                            }
                            thread::sleep(MQTT_RECONNECT_DELAY);
                        }
                    }
                }
            })
            .context("Failed to spawn MQTT thread")?;

        Ok(Self {
            client,
            topic: settings.topic.clone(),
            link_events,
            connected: false,
        })
    }
}

impl StatusLink for MqttStatusLink {
    fn poll(&mut self) -> LinkState {
        let mut reconnected = false;
        loop {
            match self.link_events.try_recv() {
                Ok(true) => {
                    self.connected = true;
                    reconnected = true;
                }
                Ok(false) => self.connected = false,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.connected = false;
                    break;
                }
            }
        }

        match (self.connected, reconnected) {
            (false, _) => LinkState::Down,
            (true, true) => LinkState::Reconnected,
            (true, false) => LinkState::Up,
        }
    }

    fn publish(&mut self, payload: &str) -> Result<()> {
        self.client
            .try_publish(self.topic.clone(), QoS::AtMostOnce, true, payload.as_bytes().to_vec())
            .context("Failed to queue status message")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::Instant;

    fn settings(port: u16) -> MqttSettings {
        MqttSettings {
            host: "127.0.0.1".to_string(),
            port,
            tls: false,
            client_id: "raillamp-test".to_string(),
            username: None,
            password: None,
            topic: DEFAULT_MQTT_TOPIC.to_string(),
        }
    }

    /// Read one MQTT packet with a single-byte remaining length.
    fn read_packet(stream: &mut TcpStream) -> Vec<u8> {
        let mut header = [0u8; 2];
        stream.read_exact(&mut header).unwrap();
        let mut packet = vec![0u8; header[1] as usize];
        stream.read_exact(&mut packet).unwrap();
        let mut whole = header.to_vec();
        whole.extend(packet);
        whole
    }

    #[test]
    fn test_unreachable_broker_reports_down() {
        let mut link = MqttStatusLink::connect(&settings(9), false).unwrap();
        assert_eq!(link.poll(), LinkState::Down);
    }

    #[test]
    fn test_publishes_retained_status_after_connack() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (packets, received) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let connect = read_packet(&mut stream);
            assert_eq!(connect[0] >> 4, 1);
            // CONNACK, session not present, accepted
            stream.write_all(&[0x20, 0x02, 0x00, 0x00]).unwrap();
            packets.send(read_packet(&mut stream)).unwrap();
            // Hold the connection open until the test is done.
            thread::sleep(Duration::from_secs(2));
        });

        let mut link = MqttStatusLink::connect(&settings(port), false).unwrap();
        let started = Instant::now();
        let mut state = link.poll();
        while state == LinkState::Down && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(10));
            state = link.poll();
        }
        assert_eq!(state, LinkState::Reconnected);
        assert_eq!(link.poll(), LinkState::Up);

        let payload = r#"{"lightsOn":true,"brightness":30,"motion":true}"#;
        link.publish(payload).unwrap();

        let publish = received.recv_timeout(Duration::from_secs(5)).unwrap();
        // PUBLISH, QoS 0, retain
        assert_eq!(publish[0], 0x31);
        let topic_len = u16::from_be_bytes([publish[2], publish[3]]) as usize;
        assert_eq!(&publish[4..4 + topic_len], DEFAULT_MQTT_TOPIC.as_bytes());
        assert_eq!(&publish[4 + topic_len..], payload.as_bytes());
    }
}
