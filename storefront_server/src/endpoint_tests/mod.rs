mod admin;
mod funnels;
mod helpers;
mod mocks;
mod orders;
