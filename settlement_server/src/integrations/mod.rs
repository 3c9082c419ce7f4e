pub mod momo;
