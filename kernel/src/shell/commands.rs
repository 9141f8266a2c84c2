/// Built-in network commands.
///
///   ip [show|set <ip> <mask> [gw]|ping <ip> [count]]
///   http [start [port]|stop|status|body <text>|file </path>|inline]
///   net [flush]
///   help
use core::fmt::{self, Write};

use crate::drivers::LinkAdapter;
use crate::net::{parse_dotted_quad, NetStack};
use crate::storage::ByteStore;
use crate::time::Clock;

/// Timeout for each `ip ping` request.
const PING_TIMEOUT_MS: u32 = 1000;

/// Dispatch a command line to the appropriate handler.
pub fn dispatch<L, S, C>(line: &str, stack: &mut NetStack<L, S, C>, out: &mut dyn Write) -> fmt::Result
where
    L: LinkAdapter,
    S: ByteStore,
    C: Clock,
{
    let mut parts = line.split_whitespace();
    let cmd = match parts.next() {
        Some(c) => c,
        None => return Ok(()),
    };

    match cmd {
        "help" | "?" => cmd_help(out),
        "ip" => cmd_ip(parts.next(), &mut parts, stack, out),
        "http" => cmd_http(line, parts.next(), &mut parts, stack, out),
        "net" => match parts.next() {
            None => cmd_net(stack, out),
            Some("flush") => {
                stack.flush_arp();
                writeln!(out, "net: arp cache flushed")
            }
            Some(_) => writeln!(out, "usage: net [flush]"),
        },
        _ => {
            writeln!(out, "unknown command: {}", cmd)?;
            writeln!(out, "type 'help' for available commands")
        }
    }
}

fn cmd_help(out: &mut dyn Write) -> fmt::Result {
    writeln!(out, "network commands:")?;
    writeln!(out)?;
    writeln!(out, "  ip                          show address, mask, gateway")?;
    writeln!(out, "  ip set <ip> <mask> [gw]     configure the interface")?;
    writeln!(out, "  ip ping <ip> [count]        send ICMP echo requests")?;
    writeln!(out, "  http start [port]           serve one page per connection (default 80)")?;
    writeln!(out, "  http stop                   stop listening")?;
    writeln!(out, "  http status                 connection state")?;
    writeln!(out, "  http body <text>            set the inline body")?;
    writeln!(out, "  http file </path>           serve a stored file")?;
    writeln!(out, "  http inline                 serve the inline body")?;
    writeln!(out, "  net                         MAC, configuration, ARP cache")?;
    writeln!(out, "  net flush                   forget every ARP entry")
}

fn cmd_ip<'a, L, S, C>(
    sub: Option<&'a str>,
    args: &mut impl Iterator<Item = &'a str>,
    stack: &mut NetStack<L, S, C>,
    out: &mut dyn Write,
) -> fmt::Result
where
    L: LinkAdapter,
    S: ByteStore,
    C: Clock,
{
    match sub {
        None | Some("show") => writeln!(out, "{}", stack.config()),
        Some("set") => {
            let (ip, mask) = match (args.next(), args.next()) {
                (Some(ip), Some(mask)) => (ip, mask),
                _ => return writeln!(out, "usage: ip set <ip> <mask> [gw]"),
            };
            match stack.configure_from_strings(ip, mask, args.next()) {
                Ok(()) => writeln!(out, "{}", stack.config()),
                Err(e) => writeln!(out, "ip: {}", e),
            }
        }
        Some("ping") => {
            let dst = match args.next().and_then(parse_dotted_quad) {
                Some(ip) => ip,
                None => return writeln!(out, "ip ping: bad address"),
            };
            let count = args.next().and_then(|c| c.parse::<u32>().ok()).unwrap_or(1);
            let summary = stack.ping(dst, count, PING_TIMEOUT_MS);
            writeln!(out, "ping {}: {} requests, {} transmitted",
                dst, summary.requested, summary.transmitted)
        }
        Some(_) => writeln!(out, "usage: ip [show|set <ip> <mask> [gw]|ping <ip> [count]]"),
    }
}

fn cmd_http<'a, L, S, C>(
    line: &'a str,
    sub: Option<&'a str>,
    args: &mut impl Iterator<Item = &'a str>,
    stack: &mut NetStack<L, S, C>,
    out: &mut dyn Write,
) -> fmt::Result
where
    L: LinkAdapter,
    S: ByteStore,
    C: Clock,
{
    match sub {
        None | Some("status") => writeln!(out, "{}", stack.tcp_status()),
        Some("start") => {
            let port = args
                .next()
                .and_then(|p| p.parse::<u16>().ok())
                .filter(|&p| p != 0)
                .unwrap_or(80);
            stack.listen(port);
            writeln!(out, "http: listening")
        }
        Some("stop") => {
            stack.stop_listening();
            writeln!(out, "http: stopped")
        }
        Some("body") => {
            let text = rest_after(line, 2);
            if text.is_empty() {
                return writeln!(out, "usage: http body <text>");
            }
            stack.set_inline_body(text);
            writeln!(out, "http: body set")
        }
        Some("file") => {
            let path = rest_after(line, 2).trim_end();
            if path.is_empty() {
                return writeln!(out, "usage: http file </path>");
            }
            stack.set_body_path(path);
            writeln!(out, "http: file mode")
        }
        Some("inline") => {
            stack.use_inline_body();
            writeln!(out, "http: inline mode")
        }
        Some(_) => writeln!(out, "usage: http [start [port]|stop|status|body <text>|file </path>|inline]"),
    }
}

fn cmd_net<L, S, C>(stack: &NetStack<L, S, C>, out: &mut dyn Write) -> fmt::Result
where
    L: LinkAdapter,
    S: ByteStore,
    C: Clock,
{
    writeln!(out, "Network interface:")?;
    writeln!(out, "  MAC:    {}", stack.mac())?;
    writeln!(out, "  {}", stack.config())?;
    writeln!(out, "  {}", stack.tcp_status())?;
    let arp = stack.arp_cache();
    if arp.is_empty() {
        return writeln!(out, "  ARP:    (empty)");
    }
    writeln!(out, "  ARP:")?;
    for entry in arp.entries() {
        writeln!(out, "    {:<15} {}  t={}ms", entry.ip, entry.mac, entry.timestamp)?;
    }
    Ok(())
}

/// Text after the first `words` whitespace-separated words, kept as typed
/// (inner and trailing spacing included).
fn rest_after(line: &str, words: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..words {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}
