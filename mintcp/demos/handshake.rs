//! A loopback tcp example
//!
//! Runs two endpoints against each other without any device in between. The client opens a
//! connection, sends a single provided message and closes its side. The server accepts the
//! connection passively and answers the close. Every segment and both connection states are
//! printed along the way.
use std::io::{stdout, Write};
use std::net;
use structopt::StructOpt;

use mintcp::layer::ip::Capture;
use mintcp::layer::tcp::{self, SlotKey};
use mintcp::wire::{TcpFlags, Ipv4Address};

fn main() {
    let Config {
        client,
        client_port,
        server,
        server_port,
        message,
    } = Config::from_args();

    let client = Ipv4Address::from(client);
    let server = Ipv4Address::from(server);

    let mut client_ip = Capture::new(client);
    let mut server_ip = Capture::new(server);
    let mut client_tcp = tcp::Endpoint::new(tcp::Config::for_layer(&client_ip));
    let mut server_tcp = tcp::Endpoint::new(tcp::Config::for_layer(&server_ip));

    let active = client_tcp.create(server, server_port, client_port)
        .expect("Couldn't create client connection");
    let passive = server_tcp.create(client, client_port, server_port)
        .expect("Couldn't create server connection");
    server_tcp.listen(passive)
        .expect("Couldn't listen");

    let out = stdout();
    let mut out = out.lock();
    report(&mut out, "initial", &client_tcp, active, &server_tcp, passive);

    client_tcp.connect(&mut client_ip, active)
        .expect("Couldn't connect");
    shuttle(&mut out, &mut client_ip, &mut server_tcp, &mut server_ip);
    shuttle(&mut out, &mut server_ip, &mut client_tcp, &mut client_ip);
    report(&mut out, "syn exchanged", &client_tcp, active, &server_tcp, passive);

    client_tcp.send(&mut client_ip, active, TcpFlags::ACK | TcpFlags::PSH, message.as_bytes())
        .expect("Couldn't send message");
    shuttle(&mut out, &mut client_ip, &mut server_tcp, &mut server_ip);
    report(&mut out, "established", &client_tcp, active, &server_tcp, passive);

    client_tcp.send(&mut client_ip, active, TcpFlags::FIN | TcpFlags::ACK, &[])
        .expect("Couldn't send fin");
    shuttle(&mut out, &mut client_ip, &mut server_tcp, &mut server_ip);
    shuttle(&mut out, &mut server_ip, &mut client_tcp, &mut client_ip);
    report(&mut out, "closed by client", &client_tcp, active, &server_tcp, passive);

    let remaining = client_tcp.teardown() + server_tcp.teardown();
    writeln!(out, "tore down {} connections", remaining).unwrap();
}

/// Feed everything one side has sent to the other endpoint.
fn shuttle(
    out: &mut impl Write,
    from: &mut Capture,
    to: &mut tcp::Endpoint,
    to_ip: &mut Capture,
) {
    for datagram in from.take() {
        let segment = datagram.repr()
            .expect("Sent an invalid segment");
        writeln!(out, "{} -> {}: {}", datagram.src_addr, datagram.dst_addr, segment).unwrap();
        to.receive(to_ip, &datagram.payload, datagram.src_addr, datagram.dst_addr)
            .expect("Couldn't process segment");
    }
}

fn report(
    out: &mut impl Write,
    step: &str,
    client: &tcp::Endpoint,
    active: SlotKey,
    server: &tcp::Endpoint,
    passive: SlotKey,
) {
    let client = client.get(active).expect("Client connection is gone");
    let server = server.get(passive).expect("Server connection is gone");
    writeln!(out, "{}: client {} ({}), server {} ({})",
        step,
        client.current, client.four_tuple(),
        server.current, server.four_tuple()).unwrap();
}

#[derive(StructOpt)]
struct Config {
    client: net::Ipv4Addr,
    client_port: u16,
    server: net::Ipv4Addr,
    server_port: u16,
    message: String,
}
