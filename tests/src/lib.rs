//! Cross-crate tests over loopback sockets, checked against independent
//! decoders (`dns-parser`, pnet packet views).

#[cfg(test)]
mod dns;
#[cfg(test)]
mod packet;
#[cfg(test)]
mod scanner;
#[cfg(test)]
mod support;
