//! Raw ICMP sockets
//!
//! The socket is created with `socket2` (for the raw type and TTL options)
//! and then driven through `tokio::net::UdpSocket`, which only needs a
//! non-blocking datagram descriptor and gives us async `send_to`/`recv_from`
//! that can run concurrently from two tasks.
//!
//! On Linux the ICMPv6 socket also asks for the hop limit of each packet as
//! ancillary data and reads it with `recvmsg`.

use super::icmp::strip_ipv4_header;
use super::{Datagram, PacketTransport};
use crate::error::{AppError, Result};
use crate::types::IpVersion;
use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, SocketAddr};
#[cfg(any(target_os = "linux", target_os = "android"))]
use std::os::fd::AsRawFd;

/// Room for the IPv4 header and ICMP header on top of the payload
const HEADER_ALLOWANCE: usize = 128;
const MIN_RECV_BUFFER: usize = 1500;

/// Raw ICMP (IPv4) or ICMPv6 socket
#[derive(Debug)]
pub struct IcmpSocket {
    socket: tokio::net::UdpSocket,
    version: IpVersion,
    recv_buffer: usize,
}

impl IcmpSocket {
    /// Open a raw socket for `version` with outgoing `ttl`
    ///
    /// Must be called from within a tokio runtime. Fails without root or
    /// CAP_NET_RAW.
    pub fn open(version: IpVersion, ttl: u8, payload_size: usize) -> Result<Self> {
        let (domain, protocol) = match version {
            IpVersion::V4 => (Domain::IPV4, Protocol::ICMPV4),
            IpVersion::V6 => (Domain::IPV6, Protocol::ICMPV6),
        };

        let socket = Socket::new(domain, Type::RAW, Some(protocol)).map_err(|e| {
            AppError::transport(format!(
                "Failed to open raw {} socket: {}",
                version.protocol_name(),
                e
            ))
        })?;

        match version {
            IpVersion::V4 => socket.set_ttl(u32::from(ttl)),
            IpVersion::V6 => socket.set_unicast_hops_v6(u32::from(ttl)),
        }
        .map_err(|e| AppError::transport(format!("Failed to set TTL {}: {}", ttl, e)))?;

        #[cfg(any(target_os = "linux", target_os = "android"))]
        if version == IpVersion::V6 {
            hop_limit::enable(socket.as_raw_fd())
                .map_err(|e| AppError::transport(format!("Failed to request hop limits: {}", e)))?;
        }

        socket
            .set_nonblocking(true)
            .map_err(|e| AppError::transport(format!("Failed to make socket non-blocking: {}", e)))?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = tokio::net::UdpSocket::from_std(std_socket)
            .map_err(|e| AppError::transport(format!("Failed to register socket with runtime: {}", e)))?;

        Ok(Self {
            socket,
            version,
            recv_buffer: (payload_size + HEADER_ALLOWANCE).max(MIN_RECV_BUFFER),
        })
    }

    pub fn version(&self) -> IpVersion {
        self.version
    }
}

#[async_trait]
impl PacketTransport for IcmpSocket {
    async fn send_to(&self, packet: &[u8], destination: IpAddr) -> io::Result<usize> {
        self.socket.send_to(packet, SocketAddr::new(destination, 0)).await
    }

    async fn recv(&self) -> io::Result<Datagram> {
        let mut buf = vec![0u8; self.recv_buffer];

        #[cfg(any(target_os = "linux", target_os = "android"))]
        if self.version == IpVersion::V6 {
            let fd = self.socket.as_raw_fd();
            let (len, source, ttl) = self
                .socket
                .async_io(tokio::io::Interest::READABLE, || hop_limit::recv(fd, &mut buf))
                .await?;
            buf.truncate(len);
            return Ok(Datagram { data: buf, source, ttl });
        }

        let (len, from) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);

        let datagram = match self.version {
            IpVersion::V4 => match strip_ipv4_header(&buf) {
                Some((ttl, body)) => Datagram {
                    data: body.to_vec(),
                    source: from.ip(),
                    ttl: Some(ttl),
                },
                None => Datagram {
                    data: buf,
                    source: from.ip(),
                    ttl: None,
                },
            },
            // No hop limit without IPV6_RECVHOPLIMIT support
            IpVersion::V6 => Datagram {
                data: buf,
                source: from.ip(),
                ttl: None,
            },
        };
        Ok(datagram)
    }
}

/// `IPV6_RECVHOPLIMIT` ancillary data
#[cfg(any(target_os = "linux", target_os = "android"))]
mod hop_limit {
    use std::io;
    use std::mem;
    use std::net::{IpAddr, Ipv6Addr};
    use std::os::fd::RawFd;

    pub fn enable(fd: RawFd) -> io::Result<()> {
        let on: libc::c_int = 1;
        // SAFETY: `on` lives across the call and its size is passed with it.
        let rc = unsafe {
            libc::setsockopt(
                fd,
                libc::IPPROTO_IPV6,
                libc::IPV6_RECVHOPLIMIT,
                (&on as *const libc::c_int).cast(),
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if rc == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// One `recvmsg` into `buf`: length, sender and hop limit if attached
    pub fn recv(fd: RawFd, buf: &mut [u8]) -> io::Result<(usize, IpAddr, Option<u8>)> {
        // u64 elements keep the control buffer aligned for cmsghdr
        let mut control = [0u64; 8];
        // SAFETY: all-zero is a valid sockaddr_in6 and msghdr.
        let mut addr: libc::sockaddr_in6 = unsafe { mem::zeroed() };
        let mut msg: libc::msghdr = unsafe { mem::zeroed() };
        let mut iov = libc::iovec {
            iov_base: buf.as_mut_ptr().cast(),
            iov_len: buf.len(),
        };

        msg.msg_name = (&mut addr as *mut libc::sockaddr_in6).cast();
        msg.msg_namelen = mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t;
        msg.msg_iov = &mut iov;
        msg.msg_iovlen = 1;
        msg.msg_control = control.as_mut_ptr().cast();
        msg.msg_controllen = mem::size_of_val(&control) as _;

        // SAFETY: every pointer in `msg` refers to a live local or to `buf`.
        let len = unsafe { libc::recvmsg(fd, &mut msg, 0) };
        if len < 0 {
            return Err(io::Error::last_os_error());
        }

        let mut hop_limit = None;
        // SAFETY: the CMSG_* walk stays within `msg_controllen` as set by
        // the kernel.
        unsafe {
            let mut cmsg = libc::CMSG_FIRSTHDR(&msg);
            while !cmsg.is_null() {
                if (*cmsg).cmsg_level == libc::IPPROTO_IPV6 && (*cmsg).cmsg_type == libc::IPV6_HOPLIMIT {
                    let value = std::ptr::read_unaligned(libc::CMSG_DATA(cmsg) as *const libc::c_int);
                    hop_limit = u8::try_from(value).ok();
                }
                cmsg = libc::CMSG_NXTHDR(&msg, cmsg);
            }
        }

        let source = IpAddr::V6(Ipv6Addr::from(addr.sin6_addr.s6_addr));
        Ok((len as usize, source, hop_limit))
    }

}
